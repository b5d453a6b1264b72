use qchain_core::receipt::Log;
use qchain_core::transaction::Transaction;
use qchain_core::types::{Address, Timestamp};

use crate::view::StateView;

/// Per-block context made available to the external EVM executor. Not
/// mutable: the executor reads it, it never writes it.
pub struct BlockContext {
    pub number: u64,
    pub timestamp: Timestamp,
    pub coinbase: Address,
}

pub struct ExecutionOutcome {
    pub gas_used: u64,
    pub status: u8,
    pub logs: Vec<Log>,
    pub return_data: Vec<u8>,
    /// Set only for a successful contract-creation transaction.
    pub new_contract_address: Option<Address>,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

/// The excluded bytecode interpreter's seam: `execute(tx, block,
/// state_view, gas_limit) -> (gas_used, status, logs, return_data)`.
/// Deliberately out of scope; the core only depends on this contract.
pub trait EvmExecutor: Send + Sync {
    fn execute(
        &self,
        tx: &Transaction,
        block: &BlockContext,
        state: &mut StateView<'_>,
        gas_limit: u64,
    ) -> ExecutionOutcome;
}

/// A deterministic stand-in for the excluded bytecode interpreter: value
/// transfer has already happened by the time this runs (see
/// [`crate::executor::apply`]), so any `data` payload is treated as an
/// opaque call with no side effects beyond the intrinsic gas already
/// charged. Always succeeds.
pub struct NoopEvmExecutor;

impl EvmExecutor for NoopEvmExecutor {
    fn execute(
        &self,
        tx: &Transaction,
        _block: &BlockContext,
        _state: &mut StateView<'_>,
        _gas_limit: u64,
    ) -> ExecutionOutcome {
        ExecutionOutcome {
            gas_used: tx.intrinsic_gas(),
            status: 1,
            logs: Vec::new(),
            return_data: Vec::new(),
            new_contract_address: None,
        }
    }
}
