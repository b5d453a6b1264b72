use std::collections::HashMap;
use std::sync::Mutex;

use qchain_consensus::{SlashReason, ValidatorSet};
use qchain_core::block::{Block, BlockHeader};
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::receipt::Receipt;
use qchain_core::types::{Address, Hash};
use qchain_executor::{BlockContext, EvmExecutor, StateView};
use qchain_state::{StateBuffer, StateStore};
use tracing::{info, warn};

/// Validate and persist blocks; expose queries over the canonical,
/// linear chain. Reorgs are out of scope: a peer-received block whose
/// number is not exactly `current_head.number + 1` is dropped.
pub struct Chain {
    store: StateStore,
    evm: Box<dyn EvmExecutor>,
    /// The last header seen per `(validator_addr, number)`, kept to catch a
    /// validator signing two different headers for the same height.
    seen_proposals: Mutex<HashMap<(Address, u64), BlockHeader>>,
}

impl Chain {
    pub fn new(store: StateStore, evm: Box<dyn EvmExecutor>) -> Self {
        Self {
            store,
            evm,
            seen_proposals: Mutex::new(HashMap::new()),
        }
    }

    /// Records `header` against its `(validator_addr, number)` slot and
    /// returns the offending address if a different header was already
    /// recorded there — conclusive double-sign evidence.
    fn check_double_sign(&self, header: &BlockHeader) -> Option<Address> {
        let key = (header.validator_addr, header.number);
        let mut seen = self.seen_proposals.lock().expect("seen_proposals mutex poisoned");
        match seen.insert(key, header.clone()) {
            Some(previous) => qchain_consensus::detect_double_sign(&previous, header),
            None => None,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn current_head(&self) -> ChainResult<Block> {
        let hash = self
            .store
            .get_current_head()?
            .ok_or_else(|| ChainError::Other("chain has no head; genesis not applied".into()))?;
        self.store
            .get_block_by_hash(&hash)?
            .ok_or_else(|| ChainError::UnknownBlock(hash.to_hex()))
    }

    /// Append protocol, atomic with respect to the head pointer. On any
    /// failure the staged `StateBuffer` is simply dropped; the
    /// persistent store is untouched.
    pub fn append(&self, block: Block, validators: &mut ValidatorSet) -> ChainResult<Vec<Receipt>> {
        let head = self.current_head()?;
        let header = &block.header;

        if let Some(offender) = self.check_double_sign(header) {
            if let Some(validator) = validators.get_mut(&offender) {
                qchain_consensus::slash(validator, SlashReason::DoubleSign, header.number);
                warn!(validator = %offender, number = header.number, "slashed validator for double-signing");
            }
            return Err(ChainError::ConsensusViolation(format!(
                "validator {offender} signed two different headers for block {}",
                header.number
            )));
        }

        // ── 1. Structural check ───────────────────────────────────────────────
        if header.parent_hash != head.hash() {
            return Err(ChainError::BlockInvalid(format!(
                "parent_hash {} does not match current head {}",
                header.parent_hash,
                head.hash()
            )));
        }
        if header.number != head.header.number + 1 {
            return Err(ChainError::BlockInvalid(format!(
                "block number {} is not current head + 1 ({})",
                header.number,
                head.header.number + 1
            )));
        }
        if header.timestamp <= head.header.timestamp {
            return Err(ChainError::BlockInvalid(
                "timestamp does not advance past parent".into(),
            ));
        }
        if header.gas_used > header.gas_limit {
            return Err(ChainError::BlockInvalid(format!(
                "gas_used {} exceeds gas_limit {}",
                header.gas_used, header.gas_limit
            )));
        }
        header.validate_extra_size()?;

        // ── 2. Consensus check ─────────────────────────────────────────────────
        qchain_consensus::check_block_consensus(header, validators, header.number)?;

        // ── 3. Transaction loop ─────────────────────────────────────────────────
        let mut buffer = StateBuffer::new();
        let mut view = StateView::new(&mut buffer, &self.store);
        let block_ctx = BlockContext {
            number: header.number,
            timestamp: header.timestamp,
            coinbase: header.coinbase,
        };

        // Steps 3-4 run inside a closure: by this point the consensus check
        // has proven `header.validator_addr` really signed this header and
        // was the scheduled proposer, so any failure from here on is
        // attributable proposer misbehavior, not a forged or stale block.
        let body: ChainResult<Vec<Receipt>> = (|| {
            let mut receipts = Vec::with_capacity(block.transactions.len());
            let mut cumulative_gas_used = 0u64;

            for (index, tx) in block.transactions.iter().enumerate() {
                if !qchain_crypto::verify(tx.signing_hash().as_bytes(), &tx.signature_envelope()) {
                    return Err(ChainError::BlockInvalid(format!(
                        "transaction {index} signature does not verify"
                    )));
                }
                let mut receipt = qchain_executor::apply(tx, &block_ctx, &mut view, self.evm.as_ref())?;
                cumulative_gas_used += receipt.gas_used;
                receipt.tx_index = index as u64;
                receipt.block_hash = block.hash();
                receipt.block_number = header.number;
                receipt.cumulative_gas_used = cumulative_gas_used;
                receipts.push(receipt);
            }

            // ── 4. Post-loop checks ───────────────────────────────────────────────
            if header.gas_used != cumulative_gas_used {
                return Err(ChainError::BlockInvalid(format!(
                    "header.gas_used {} does not match cumulative gas used {}",
                    header.gas_used, cumulative_gas_used
                )));
            }
            let computed_tx_root = block.tx_root();
            if header.tx_root != computed_tx_root {
                return Err(ChainError::BlockInvalid(format!(
                    "header.tx_root {} does not match computed root {}",
                    header.tx_root, computed_tx_root
                )));
            }
            Ok(receipts)
        })();

        let receipts = match body {
            Ok(receipts) => receipts,
            Err(e) => {
                if let Some(validator) = validators.get_mut(&header.validator_addr) {
                    qchain_consensus::slash(validator, SlashReason::InvalidBlock, header.number);
                    warn!(
                        validator = %header.validator_addr,
                        number = header.number,
                        error = %e,
                        "slashed proposer for an invalid block"
                    );
                }
                return Err(e);
            }
        };

        // ── 5. Block reward ──────────────────────────────────────────────────────
        qchain_consensus::distribute_reward(&mut view, header.coinbase)?;

        // ── 6. Commit ─────────────────────────────────────────────────────────────
        let block_hash = block.hash();
        buffer.commit(&self.store)?;
        self.store.put_block(&block)?;
        self.store.put_receipts(&block_hash, &receipts)?;
        self.store.set_current_head(block_hash)?;
        self.store.flush()?;

        info!(number = header.number, hash = %block_hash, txs = block.transactions.len(), "appended block");
        Ok(receipts)
    }

    pub fn by_number(&self, number: u64) -> ChainResult<Option<Block>> {
        self.store.get_block_by_number(number)
    }

    pub fn by_hash(&self, hash: &Hash) -> ChainResult<Option<Block>> {
        self.store.get_block_by_hash(hash)
    }

    pub fn receipts(&self, block_hash: &Hash) -> ChainResult<Vec<Receipt>> {
        self.store.get_receipts(block_hash)
    }

    pub fn receipt_by_tx_hash(&self, tx_hash: &Hash) -> ChainResult<Option<Receipt>> {
        self.store.get_receipt_by_tx_hash(tx_hash)
    }
}

/// Whether a peer-received block's number makes it eligible for
/// appending under the linear-only reorg policy: `number` must be
/// exactly `current_head.number + 1`. Anything else (including
/// `number <= current_head.number`) is dropped by the caller.
pub fn accepts_block_number(current_head_number: u64, candidate_number: u64) -> bool {
    if candidate_number <= current_head_number {
        warn!(candidate_number, current_head_number, "dropping non-advancing block");
        return false;
    }
    candidate_number == current_head_number + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;
    use qchain_consensus::ValidatorInfo;
    use qchain_core::types::{Address, Balance, SigAlg};
    use qchain_crypto::KeyPair;
    use qchain_executor::NoopEvmExecutor;

    fn open_temp(name: &str) -> StateStore {
        let dir = std::env::temp_dir().join(format!("qchain_chain_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        StateStore::open(&dir).unwrap()
    }

    fn single_validator(keypair: &KeyPair) -> ValidatorSet {
        ValidatorSet::new(vec![ValidatorInfo {
            address: keypair.address(),
            public_key: keypair.public_key.clone(),
            sig_alg: keypair.algorithm,
            stake: U256::from(1_000u64),
            last_active: 0,
            jailed: false,
            jail_until: None,
            commission_bps: 0,
        }])
        .unwrap()
    }

    fn genesis_block(coinbase: Address) -> Block {
        let header = Block::unsigned_header(
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            coinbase,
            coinbase,
            0,
            30_000_000,
            0,
            0,
            vec![],
            SigAlg::Dilithium,
        );
        Block {
            header,
            transactions: vec![],
        }
    }

    fn seed_genesis(store: &StateStore, coinbase: Address) -> Hash {
        let genesis = genesis_block(coinbase);
        let hash = genesis.hash();
        store.put_block(&genesis).unwrap();
        store.set_genesis_hash(hash).unwrap();
        store.set_current_head(hash).unwrap();
        hash
    }

    #[test]
    fn reorg_policy_drops_non_advancing_blocks() {
        assert!(!accepts_block_number(10, 10));
        assert!(!accepts_block_number(10, 9));
        assert!(!accepts_block_number(10, 12));
        assert!(accepts_block_number(10, 11));
    }

    #[test]
    fn appends_a_valid_empty_block_and_advances_head() {
        let store = open_temp("append_empty");
        let keypair = KeyPair::generate(SigAlg::Dilithium);
        let mut validators = single_validator(&keypair);
        seed_genesis(&store, keypair.address());

        let chain = Chain::new(store, Box::new(NoopEvmExecutor));
        let head = chain.current_head().unwrap();

        let template = Block::unsigned_header(
            head.hash(),
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            keypair.address(),
            keypair.address(),
            1,
            30_000_000,
            0,
            1,
            vec![],
            keypair.algorithm,
        );
        let header = qchain_consensus::sign_header(&keypair, template).unwrap();
        let block = Block {
            header,
            transactions: vec![],
        };

        chain.append(block, &mut validators).unwrap();
        assert_eq!(chain.current_head().unwrap().header.number, 1);
    }

    #[test]
    fn rejects_block_with_wrong_parent_hash() {
        let store = open_temp("wrong_parent");
        let keypair = KeyPair::generate(SigAlg::Dilithium);
        let mut validators = single_validator(&keypair);
        seed_genesis(&store, keypair.address());
        let chain = Chain::new(store, Box::new(NoopEvmExecutor));

        let template = Block::unsigned_header(
            Hash::keccak256(b"not the real parent"),
            Hash::ZERO,
            Hash::ZERO,
            Hash::ZERO,
            keypair.address(),
            keypair.address(),
            1,
            30_000_000,
            0,
            1,
            vec![],
            keypair.algorithm,
        );
        let header = qchain_consensus::sign_header(&keypair, template).unwrap();
        let block = Block {
            header,
            transactions: vec![],
        };
        let err = chain.append(block, &mut validators).unwrap_err();
        assert!(matches!(err, ChainError::BlockInvalid(_)));
    }

    #[test]
    fn executes_a_transfer_and_persists_its_receipt() {
        let store = open_temp("executes_transfer");
        let proposer = KeyPair::generate(SigAlg::Dilithium);
        let sender = KeyPair::generate(SigAlg::Dilithium);
        let mut validators = single_validator(&proposer);
        seed_genesis(&store, proposer.address());
        store.set_balance(&sender.address(), Balance::from(10_000_000u64)).unwrap();
        store.flush().unwrap();

        let chain = Chain::new(store, Box::new(NoopEvmExecutor));
        let head = chain.current_head().unwrap();

        let to = Address([0x42u8; 20]);
        let mut tx = qchain_core::transaction::Transaction {
            chain_id: 8888,
            nonce: 0,
            gas_price: Balance::from(1u64),
            gas: 21_000,
            to: Some(to),
            value: Balance::from(1_000u64),
            data: vec![],
            sig_alg: SigAlg::Dilithium,
            public_key: sender.public_key.clone(),
            signature: vec![],
            kem_capsule: None,
        };
        tx.signature = sender.sign(tx.signing_hash().as_bytes()).unwrap();

        let transactions = vec![tx];
        let tx_root = Block::merkle_root(
            &transactions.iter().map(|t| t.hash()).collect::<Vec<_>>(),
        );
        let template = Block::unsigned_header(
            head.hash(),
            Hash::ZERO,
            tx_root,
            Hash::ZERO,
            proposer.address(),
            proposer.address(),
            1,
            30_000_000,
            21_000,
            1,
            vec![],
            proposer.algorithm,
        );
        let header = qchain_consensus::sign_header(&proposer, template).unwrap();
        let block = Block { header, transactions };
        let block_hash = block.hash();

        let receipts = chain.append(block, &mut validators).unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].status, 1);
        assert_eq!(chain.store().get_balance(&to).unwrap(), Balance::from(1_000u64));

        let fetched = chain.receipts(&block_hash).unwrap();
        assert_eq!(fetched.len(), 1);
    }

    #[test]
    fn rejected_append_leaves_store_and_head_untouched() {
        let store = open_temp("rejected_append_untouched");
        let proposer = KeyPair::generate(SigAlg::Dilithium);
        let sender = KeyPair::generate(SigAlg::Dilithium);
        let mut validators = single_validator(&proposer);
        let genesis_hash = seed_genesis(&store, proposer.address());
        store.set_balance(&sender.address(), Balance::from(10_000_000u64)).unwrap();
        store.flush().unwrap();

        let chain = Chain::new(store, Box::new(NoopEvmExecutor));
        let head = chain.current_head().unwrap();

        let to = Address([0x55u8; 20]);
        let mut tx = qchain_core::transaction::Transaction {
            chain_id: 8888,
            nonce: 0,
            gas_price: Balance::from(1u64),
            gas: 21_000,
            to: Some(to),
            value: Balance::from(1_000u64),
            data: vec![],
            sig_alg: SigAlg::Dilithium,
            public_key: sender.public_key.clone(),
            signature: vec![],
            kem_capsule: None,
        };
        tx.signature = sender.sign(tx.signing_hash().as_bytes()).unwrap();
        tx.signature[0] ^= 0xff; // tamper: signature no longer verifies

        let transactions = vec![tx];
        let tx_root = Block::merkle_root(
            &transactions.iter().map(|t| t.hash()).collect::<Vec<_>>(),
        );
        let template = Block::unsigned_header(
            head.hash(),
            Hash::ZERO,
            tx_root,
            Hash::ZERO,
            proposer.address(),
            proposer.address(),
            1,
            30_000_000,
            21_000,
            1,
            vec![],
            proposer.algorithm,
        );
        let header = qchain_consensus::sign_header(&proposer, template).unwrap();
        let block = Block { header, transactions };

        let err = chain.append(block, &mut validators).unwrap_err();
        assert!(matches!(err, ChainError::BlockInvalid(_)));

        assert_eq!(chain.current_head().unwrap().hash(), genesis_hash);
        assert_eq!(chain.store().get_balance(&to).unwrap(), Balance::from(0u64));
        assert_eq!(
            chain.store().get_balance(&sender.address()).unwrap(),
            Balance::from(10_000_000u64)
        );
        assert_eq!(chain.store().get_nonce(&sender.address()).unwrap(), 0);

        // The proposer's signature and proposer slot were genuinely valid;
        // the block body is what failed, so the proposer itself is slashed.
        let proposer_info = validators.get(&proposer.address()).unwrap();
        assert!(proposer_info.jailed);
        assert_eq!(proposer_info.stake, Balance::from(900u64));
    }

    #[test]
    fn double_signed_header_is_rejected_and_slashes_the_signer() {
        let store = open_temp("double_sign_rejected");
        let proposer = KeyPair::generate(SigAlg::Dilithium);
        let mut validators = single_validator(&proposer);
        seed_genesis(&store, proposer.address());

        let chain = Chain::new(store, Box::new(NoopEvmExecutor));
        let head = chain.current_head().unwrap();

        let build = |extra: Vec<u8>| {
            let template = Block::unsigned_header(
                head.hash(),
                Hash::ZERO,
                Hash::ZERO,
                Hash::ZERO,
                proposer.address(),
                proposer.address(),
                1,
                30_000_000,
                0,
                1,
                extra,
                proposer.algorithm,
            );
            let header = qchain_consensus::sign_header(&proposer, template).unwrap();
            Block {
                header,
                transactions: vec![],
            }
        };

        let first = build(vec![1]);
        let second = build(vec![2]);

        chain.append(first, &mut validators).unwrap();
        let err = chain.append(second, &mut validators).unwrap_err();
        assert!(matches!(err, ChainError::ConsensusViolation(_)));

        let proposer_info = validators.get(&proposer.address()).unwrap();
        assert!(proposer_info.jailed);
        assert_eq!(proposer_info.jail_until, None);
    }
}
