use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use qchain_core::constants::MAX_TX_SIZE_BYTES;
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::transaction::Transaction;
use qchain_core::types::{Address, Hash};
use tracing::debug;

use crate::config::PoolConfig;

/// Per-sender nonce-ordered queue plus the global hash index. Mirrors
/// the teacher's validation-then-insert shape: every admission check
/// below runs fail-fast, in order, before a single write-lock section
/// touches these maps.
#[derive(Default)]
struct Inner {
    by_hash: HashMap<Hash, Transaction>,
    by_sender: HashMap<Address, BTreeMap<u64, Hash>>,
}

pub struct TxPool {
    config: PoolConfig,
    inner: RwLock<Inner>,
}

impl TxPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.read().unwrap().by_hash.contains_key(hash)
    }

    /// Admit a transaction. Every check up to and including signature
    /// verification runs with no lock held; only the final insertion
    /// step takes the write lock.
    pub fn admit(&self, tx: Transaction) -> ChainResult<()> {
        let size = tx.size_bytes()?;
        if size > MAX_TX_SIZE_BYTES {
            return Err(ChainError::TransactionTooLarge {
                size,
                max: MAX_TX_SIZE_BYTES,
            });
        }
        if tx.chain_id != self.config.chain_id {
            return Err(ChainError::ChainIdMismatch {
                expected: self.config.chain_id,
                got: tx.chain_id,
            });
        }
        if tx.gas_price < self.config.min_gas_price {
            return Err(ChainError::GasPriceTooLow {
                got: tx.gas_price.to_string(),
                min: self.config.min_gas_price.to_string(),
            });
        }
        // tx.sig_alg is typed as `SigAlg`, which only exists for recognized
        // tags (unrecognized tags are rejected at deserialization, by
        // `SigAlg::from_tag`); there is nothing left to check here.
        if !qchain_crypto::verify(tx.signing_hash().as_bytes(), &tx.signature_envelope()) {
            return Err(ChainError::SignatureInvalid);
        }

        let hash = tx.hash();
        let from = tx.from_address();

        let mut inner = self.inner.write().unwrap();

        if inner.by_hash.contains_key(&hash) {
            return Err(ChainError::Duplicate(hash.to_hex()));
        }

        if let Some(existing_hash) = inner
            .by_sender
            .get(&from)
            .and_then(|queue| queue.get(&tx.nonce))
            .copied()
        {
            let existing = inner.by_hash.get(&existing_hash).expect("index consistent");
            let bump = existing.gas_price * primitive_types::U256::from(self.config.replacement_bump_bps)
                / primitive_types::U256::from(10_000u64);
            let min_required = existing.gas_price + bump;
            if tx.gas_price < min_required {
                return Err(ChainError::Duplicate(format!(
                    "replacement underpriced for sender {from} nonce {}",
                    tx.nonce
                )));
            }
            let nonce = tx.nonce;
            inner.by_hash.remove(&existing_hash);
            inner.by_hash.insert(hash, tx);
            inner
                .by_sender
                .get_mut(&from)
                .expect("queue exists")
                .insert(nonce, hash);
            return Ok(());
        }

        if inner.by_hash.len() >= self.config.capacity {
            if !evict_one(&mut inner) {
                return Err(ChainError::PoolFull {
                    capacity: self.config.capacity,
                });
            }
        }

        inner.by_sender.entry(from).or_default().insert(tx.nonce, hash);
        inner.by_hash.insert(hash, tx);
        debug!(%hash, %from, "transaction admitted to pool");
        Ok(())
    }

    /// Deterministic selection: senders in ascending address order, each
    /// sender's own transactions in strict ascending nonce order, until
    /// `max_count` transactions have been collected. Executability
    /// against current chain state is the caller's concern, not the
    /// pool's — a pool entry may sit on a nonce gap until the account
    /// catches up.
    pub fn get_pending(&self, max_count: usize) -> Vec<Transaction> {
        let inner = self.inner.read().unwrap();
        let mut senders: Vec<&Address> = inner.by_sender.keys().collect();
        senders.sort();

        let mut out = Vec::with_capacity(max_count.min(inner.by_hash.len()));
        'outer: for sender in senders {
            let queue = &inner.by_sender[sender];
            for hash in queue.values() {
                if out.len() >= max_count {
                    break 'outer;
                }
                out.push(inner.by_hash[hash].clone());
            }
        }
        out
    }

    /// Remove a transaction once it has been included in an appended
    /// block (or otherwise no longer belongs in the pool).
    pub fn remove(&self, hash: &Hash) {
        let mut inner = self.inner.write().unwrap();
        if let Some(tx) = inner.by_hash.remove(hash) {
            let from = tx.from_address();
            if let Some(queue) = inner.by_sender.get_mut(&from) {
                queue.remove(&tx.nonce);
                if queue.is_empty() {
                    inner.by_sender.remove(&from);
                }
            }
        }
    }
}

/// Evict the transaction with the lowest gas price among each sender's
/// highest-nonce (tail) entry. Returns `false` if the pool is empty.
fn evict_one(inner: &mut Inner) -> bool {
    let mut victim: Option<(Address, u64, Hash)> = None;
    for (sender, queue) in inner.by_sender.iter() {
        if let Some((&nonce, &hash)) = queue.iter().next_back() {
            let gas_price = inner.by_hash[&hash].gas_price;
            let replace = match &victim {
                None => true,
                Some((_, _, current_hash)) => {
                    gas_price < inner.by_hash[current_hash].gas_price
                }
            };
            if replace {
                victim = Some((*sender, nonce, hash));
            }
        }
    }
    match victim {
        Some((sender, nonce, hash)) => {
            inner.by_hash.remove(&hash);
            if let Some(queue) = inner.by_sender.get_mut(&sender) {
                queue.remove(&nonce);
                if queue.is_empty() {
                    inner.by_sender.remove(&sender);
                }
            }
            true
        }
        None => false,
    }
}
