use serde::{Deserialize, Serialize};

/// JSON-serializable block header, returned by `qchain_getBlockByNumber` /
/// `qchain_getBlockByHash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcBlock {
    pub hash: String,
    pub parent_hash: String,
    pub state_root: String,
    pub tx_root: String,
    pub receipt_root: String,
    pub coinbase: String,
    pub validator_addr: String,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub transactions: Vec<String>,
}

/// JSON-serializable receipt, returned by `qchain_getReceipt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReceipt {
    pub tx_hash: String,
    pub block_hash: String,
    pub block_number: u64,
    pub tx_index: u64,
    pub status: u8,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub contract_address: Option<String>,
    pub logs: Vec<String>,
}

/// Genesis / protocol constants, returned by `qchain_getGenesisInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcGenesisInfo {
    pub chain_id: u64,
    pub genesis_hash: String,
}
