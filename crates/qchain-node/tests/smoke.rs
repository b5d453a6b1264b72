//! In-process smoke test covering genesis, pool admission, block
//! production and chain append together — the same path the node's
//! main loop drives, minus the RPC server and the binary itself.

use std::collections::HashMap;
use std::path::PathBuf;

use primitive_types::U256;
use qchain_chain::Chain;
use qchain_core::block::Block;
use qchain_core::transaction::Transaction;
use qchain_core::types::{Address, SigAlg};
use qchain_crypto::KeyPair;
use qchain_executor::{apply, BlockContext, NoopEvmExecutor, StateView};
use qchain_genesis::{apply_genesis, AllocEntry, ChainConfig, GenesisConfig, ValidatorEntry};
use qchain_pool::{PoolConfig, TxPool};
use qchain_state::{StateBuffer, StateStore};

const CHAIN_ID: u64 = 8888;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qchain_node_smoke_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn genesis_pool_and_block_production_update_balances() {
    // ── 1. Genesis: one validator, one funded account ─────────────────────────
    let validator = KeyPair::generate(SigAlg::Dilithium);
    let sender = KeyPair::generate(SigAlg::Dilithium);

    let mut alloc = HashMap::new();
    alloc.insert(
        sender.address().to_hex(),
        AllocEntry {
            balance: "0x2540be400".to_string(), // 10_000_000_000
            code: None,
            storage: None,
        },
    );

    let config = GenesisConfig {
        config: ChainConfig { chain_id: CHAIN_ID },
        difficulty: "0x0".to_string(),
        gas_limit: "0x1c9c380".to_string(), // 30_000_000
        timestamp: 1,
        alloc,
        validators: vec![ValidatorEntry {
            address: validator.address().to_hex(),
            stake: "0x3e8".to_string(), // 1000
            public_key: format!("0x{}", hex::encode(&validator.public_key)),
            sig_alg: "dilithium".to_string(),
        }],
    };

    let dir = temp_dir("state");
    let store = StateStore::open(&dir).unwrap();
    let (genesis_block, mut validators) = apply_genesis(&store, &config).unwrap();
    assert_eq!(
        store.get_balance(&sender.address()).unwrap(),
        U256::from(0x2540be400u64)
    );

    // ── 2. Submit a signed transfer to the pool ───────────────────────────────
    let pool = TxPool::new(PoolConfig::new(CHAIN_ID));
    let recipient = Address([0x77u8; 20]);
    let mut tx = Transaction {
        chain_id: CHAIN_ID,
        nonce: 0,
        gas_price: U256::from(1u64),
        gas: 21_000,
        to: Some(recipient),
        value: U256::from(1_000u64),
        data: vec![],
        sig_alg: SigAlg::Dilithium,
        public_key: sender.public_key.clone(),
        signature: vec![],
        kem_capsule: None,
    };
    tx.signature = sender.sign(tx.signing_hash().as_bytes()).unwrap();
    let tx_hash = tx.hash();
    pool.admit(tx).unwrap();
    assert_eq!(pool.len(), 1);

    // ── 3. Build a block the way the node's scheduler would: dry-run the
    //      pool's candidates against a scratch buffer, then sign the header
    //      that commits to the real gas_used/tx_root ───────────────────────────
    let chain = Chain::new(store.clone(), Box::new(NoopEvmExecutor));
    let head = chain.current_head().unwrap();
    assert_eq!(head.hash(), genesis_block.hash());

    let candidates = pool.get_pending(512);
    let mut buffer = StateBuffer::new();
    let mut view = StateView::new(&mut buffer, chain.store());
    let block_ctx = BlockContext {
        number: 1,
        timestamp: 2,
        coinbase: validator.address(),
    };
    let mut included = Vec::new();
    let mut gas_used = 0u64;
    for candidate in candidates {
        let receipt = apply(&candidate, &block_ctx, &mut view, &NoopEvmExecutor).unwrap();
        gas_used += receipt.gas_used;
        included.push(candidate);
    }
    let tx_root = Block::merkle_root(&included.iter().map(|t| t.hash()).collect::<Vec<_>>());

    let template = Block::unsigned_header(
        head.hash(),
        qchain_core::types::Hash::ZERO,
        tx_root,
        qchain_core::types::Hash::ZERO,
        validator.address(),
        validator.address(),
        1,
        0x1c9c380,
        gas_used,
        2,
        Vec::new(),
        validator.algorithm,
    );
    let header = qchain_consensus::sign_header(&validator, template).unwrap();
    let block = Block {
        header,
        transactions: included,
    };

    // ── 4. Append and verify state reflects the transfer ──────────────────────
    let receipts = chain.append(block, &mut validators).unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].status, 1);
    assert_eq!(receipts[0].tx_hash, tx_hash);

    assert_eq!(
        chain.store().get_balance(&recipient).unwrap(),
        U256::from(1_000u64)
    );
    assert_eq!(
        chain.store().get_balance(&sender.address()).unwrap(),
        U256::from(0x2540be400u64) - U256::from(1_000u64) - U256::from(21_000u64)
    );
    assert_eq!(chain.store().get_nonce(&sender.address()).unwrap(), 1);

    pool.remove(&tx_hash);
    assert!(pool.is_empty());

    let fetched = chain.receipt_by_tx_hash(&tx_hash).unwrap().unwrap();
    assert_eq!(fetched.block_number, 1);
}

#[test]
fn reapplying_genesis_against_the_same_store_is_idempotent() {
    let validator = KeyPair::generate(SigAlg::Dilithium);
    let config = GenesisConfig {
        config: ChainConfig { chain_id: CHAIN_ID },
        difficulty: "0x0".to_string(),
        gas_limit: "0x1c9c380".to_string(),
        timestamp: 7,
        alloc: HashMap::new(),
        validators: vec![ValidatorEntry {
            address: validator.address().to_hex(),
            stake: "0x1".to_string(),
            public_key: format!("0x{}", hex::encode(&validator.public_key)),
            sig_alg: "dilithium".to_string(),
        }],
    };

    let dir = temp_dir("idempotent");
    let store = StateStore::open(&dir).unwrap();
    let (first, _) = apply_genesis(&store, &config).unwrap();
    let (second, _) = apply_genesis(&store, &config).unwrap();
    assert_eq!(first.hash(), second.hash());
}
