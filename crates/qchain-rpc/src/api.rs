use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcBlock, RpcGenesisInfo, RpcReceipt};

/// The node's JSON-RPC 2.0 API. All method names are prefixed with
/// "qchain_" via `namespace = "qchain"`.
#[rpc(server, namespace = "qchain")]
pub trait QchainApi {
    /// Get a block by its height.
    #[method(name = "getBlockByNumber")]
    async fn get_block_by_number(&self, number: u64) -> RpcResult<Option<RpcBlock>>;

    /// Get a block by its hash (hex, with or without `0x`).
    #[method(name = "getBlockByHash")]
    async fn get_block_by_hash(&self, hash: String) -> RpcResult<Option<RpcBlock>>;

    /// Get the receipt for a transaction, by its hash.
    #[method(name = "getReceipt")]
    async fn get_receipt(&self, tx_hash: String) -> RpcResult<Option<RpcReceipt>>;

    /// Get an account's balance, in quanta, as a decimal string.
    #[method(name = "getBalance")]
    async fn get_balance(&self, address: String) -> RpcResult<String>;

    /// Get an account's current nonce.
    #[method(name = "getTransactionCount")]
    async fn get_transaction_count(&self, address: String) -> RpcResult<u64>;

    /// Submit a signed transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Returns the transaction hash on admission to the pool.
    #[method(name = "sendRawTransaction")]
    async fn send_raw_transaction(&self, tx_hex: String) -> RpcResult<String>;

    /// Return chain id and genesis hash.
    #[method(name = "getGenesisInfo")]
    async fn get_genesis_info(&self) -> RpcResult<RpcGenesisInfo>;
}
