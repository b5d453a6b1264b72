use crate::types::{Address, Hash};
use serde::{Deserialize, Serialize};

/// A single EVM log entry, as returned by the external executor seam.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub tx_index: u64,
    pub block_hash: Hash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub contract_address: Option<Address>,
    /// `1` success, `0` failure (EVM execution reverted or burned gas).
    pub status: u8,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}
