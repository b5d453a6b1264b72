use primitive_types::U256;
use qchain_core::error::ChainResult;
use qchain_core::types::{Address, Hash};
use qchain_state::{StateBuffer, StateBufferCheckpoint, StateStore};

/// The scoped, mutable view an `EvmExecutor` implementation receives for
/// the duration of one transaction: the per-block staged buffer, backed
/// by the persistent store for reads that miss the buffer.
pub struct StateView<'a> {
    pub buffer: &'a mut StateBuffer,
    pub store: &'a StateStore,
}

impl<'a> StateView<'a> {
    pub fn new(buffer: &'a mut StateBuffer, store: &'a StateStore) -> Self {
        Self { buffer, store }
    }

    pub fn get_balance(&self, addr: &Address) -> ChainResult<U256> {
        self.buffer.get_balance(self.store, addr)
    }

    pub fn set_balance(&mut self, addr: Address, value: U256) {
        self.buffer.set_balance(addr, value);
    }

    pub fn get_nonce(&self, addr: &Address) -> ChainResult<u64> {
        self.buffer.get_nonce(self.store, addr)
    }

    pub fn set_nonce(&mut self, addr: Address, value: u64) {
        self.buffer.set_nonce(addr, value);
    }

    pub fn get_code(&self, addr: &Address) -> ChainResult<Vec<u8>> {
        self.buffer.get_code(self.store, addr)
    }

    pub fn set_code(&mut self, addr: Address, code: Vec<u8>) {
        self.buffer.set_code(addr, code);
    }

    pub fn get_storage(&self, addr: &Address, key: &Hash) -> ChainResult<Hash> {
        self.buffer.get_storage(self.store, addr, key)
    }

    pub fn set_storage(&mut self, addr: Address, key: Hash, value: Hash) {
        self.buffer.set_storage(addr, key, value);
    }

    pub fn is_empty(&self, addr: &Address) -> ChainResult<bool> {
        self.buffer.is_empty(self.store, addr)
    }

    pub fn checkpoint(&self) -> StateBufferCheckpoint {
        self.buffer.checkpoint()
    }

    pub fn restore(&mut self, checkpoint: StateBufferCheckpoint) {
        self.buffer.restore(checkpoint)
    }
}
