use std::collections::HashMap;

use primitive_types::U256;
use qchain_core::error::ChainResult;
use qchain_core::types::{Address, Hash};

use crate::store::StateStore;

/// All state changes staged while executing one block, committed
/// atomically on successful append and discarded on rejection. Reads
/// check the buffer before falling through to the underlying store,
/// mirroring the transition engine's "collect mutations, commit once
/// validation is complete" pattern.
#[derive(Default)]
pub struct StateBuffer {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    codes: HashMap<Address, Vec<u8>>,
    storage: HashMap<(Address, Hash), Hash>,
}

/// Opaque snapshot returned by [`StateBuffer::checkpoint`].
pub struct StateBufferCheckpoint {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    codes: HashMap<Address, Vec<u8>>,
    storage: HashMap<(Address, Hash), Hash>,
}

impl StateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_balance(&self, store: &StateStore, addr: &Address) -> ChainResult<U256> {
        match self.balances.get(addr) {
            Some(v) => Ok(*v),
            None => store.get_balance(addr),
        }
    }

    pub fn set_balance(&mut self, addr: Address, value: U256) {
        self.balances.insert(addr, value);
    }

    pub fn get_nonce(&self, store: &StateStore, addr: &Address) -> ChainResult<u64> {
        match self.nonces.get(addr) {
            Some(v) => Ok(*v),
            None => store.get_nonce(addr),
        }
    }

    pub fn set_nonce(&mut self, addr: Address, value: u64) {
        self.nonces.insert(addr, value);
    }

    pub fn get_code(&self, store: &StateStore, addr: &Address) -> ChainResult<Vec<u8>> {
        match self.codes.get(addr) {
            Some(v) => Ok(v.clone()),
            None => store.get_code(addr),
        }
    }

    /// Stage code installation. Callers are responsible for having
    /// already checked the target address is empty — the buffer itself
    /// does not re-derive the account, matching `set_code`'s "only
    /// during contract creation" contract on `StateStore`.
    pub fn set_code(&mut self, addr: Address, code: Vec<u8>) {
        self.codes.insert(addr, code);
    }

    pub fn get_storage(&self, store: &StateStore, addr: &Address, key: &Hash) -> ChainResult<Hash> {
        match self.storage.get(&(*addr, *key)) {
            Some(v) => Ok(*v),
            None => store.get_storage(addr, key),
        }
    }

    pub fn set_storage(&mut self, addr: Address, key: Hash, value: Hash) {
        self.storage.insert((addr, key), value);
    }

    pub fn account_exists(&self, store: &StateStore, addr: &Address) -> ChainResult<bool> {
        if self.balances.contains_key(addr) || self.nonces.contains_key(addr) || self.codes.contains_key(addr) {
            return Ok(true);
        }
        store.account_exists(addr)
    }

    pub fn is_empty(&self, store: &StateStore, addr: &Address) -> ChainResult<bool> {
        Ok(self.get_balance(store, addr)?.is_zero()
            && self.get_nonce(store, addr)? == 0
            && self.get_code(store, addr)?.is_empty())
    }

    /// Snapshot every staged mutation so a failed in-block operation (a
    /// transaction whose EVM execution reverts) can be undone without
    /// discarding mutations staged by transactions that already
    /// succeeded earlier in the same block.
    pub fn checkpoint(&self) -> StateBufferCheckpoint {
        StateBufferCheckpoint {
            balances: self.balances.clone(),
            nonces: self.nonces.clone(),
            codes: self.codes.clone(),
            storage: self.storage.clone(),
        }
    }

    pub fn restore(&mut self, checkpoint: StateBufferCheckpoint) {
        self.balances = checkpoint.balances;
        self.nonces = checkpoint.nonces;
        self.codes = checkpoint.codes;
        self.storage = checkpoint.storage;
    }

    /// Flush every staged mutation into `store`. Called once, after the
    /// whole block has validated and executed successfully.
    pub fn commit(self, store: &StateStore) -> ChainResult<()> {
        for (addr, value) in self.balances {
            store.set_balance(&addr, value)?;
        }
        for (addr, value) in self.nonces {
            store.set_nonce(&addr, value)?;
        }
        for (addr, code) in self.codes {
            store.set_code(&addr, code)?;
        }
        for ((addr, key), value) in self.storage {
            store.set_storage(&addr, &key, value)?;
        }
        Ok(())
    }
}
