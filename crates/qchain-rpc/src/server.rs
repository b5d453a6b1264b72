use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use qchain_chain::Chain;
use qchain_core::block::Block;
use qchain_core::receipt::Receipt;
use qchain_core::transaction::Transaction;
use qchain_core::types::{Address, Hash};
use qchain_pool::TxPool;

use crate::api::QchainApiServer;
use crate::types::{RpcBlock, RpcGenesisInfo, RpcReceipt};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn block_to_rpc(block: &Block) -> RpcBlock {
    let h = &block.header;
    RpcBlock {
        hash: block.hash().to_hex(),
        parent_hash: h.parent_hash.to_hex(),
        state_root: h.state_root.to_hex(),
        tx_root: h.tx_root.to_hex(),
        receipt_root: h.receipt_root.to_hex(),
        coinbase: h.coinbase.to_hex(),
        validator_addr: h.validator_addr.to_hex(),
        number: h.number,
        gas_limit: h.gas_limit,
        gas_used: h.gas_used,
        timestamp: h.timestamp,
        transactions: block.transactions.iter().map(|tx| tx.hash().to_hex()).collect(),
    }
}

fn receipt_to_rpc(receipt: &Receipt) -> RpcReceipt {
    RpcReceipt {
        tx_hash: receipt.tx_hash.to_hex(),
        block_hash: receipt.block_hash.to_hex(),
        block_number: receipt.block_number,
        tx_index: receipt.tx_index,
        status: receipt.status,
        gas_used: receipt.gas_used,
        cumulative_gas_used: receipt.cumulative_gas_used,
        contract_address: receipt.contract_address.map(|a| a.to_hex()),
        logs: receipt
            .logs
            .iter()
            .map(|log| format!("{}:{}", log.address.to_hex(), hex::encode(&log.data)))
            .collect(),
    }
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub chain: Arc<Chain>,
    pub pool: Arc<TxPool>,
    pub chain_id: u64,
    pub genesis_hash: Hash,
}

pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS. Returns a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl QchainApiServer for RpcServer {
    async fn get_block_by_number(&self, number: u64) -> RpcResult<Option<RpcBlock>> {
        let block = self
            .state
            .chain
            .by_number(number)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(block.as_ref().map(block_to_rpc))
    }

    async fn get_block_by_hash(&self, hash: String) -> RpcResult<Option<RpcBlock>> {
        let hash = Hash::from_hex(&hash).map_err(|e| rpc_err(-32602, format!("invalid hash: {e}")))?;
        let block = self
            .state
            .chain
            .by_hash(&hash)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(block.as_ref().map(block_to_rpc))
    }

    async fn get_receipt(&self, tx_hash: String) -> RpcResult<Option<RpcReceipt>> {
        let hash = Hash::from_hex(&tx_hash).map_err(|e| rpc_err(-32602, format!("invalid hash: {e}")))?;
        let receipt = self
            .state
            .chain
            .receipt_by_tx_hash(&hash)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(receipt.as_ref().map(receipt_to_rpc))
    }

    async fn get_balance(&self, address: String) -> RpcResult<String> {
        let addr = Address::from_hex(&address).map_err(|e| rpc_err(-32602, format!("invalid address: {e}")))?;
        let balance = self
            .state
            .chain
            .store()
            .get_balance(&addr)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(balance.to_string())
    }

    async fn get_transaction_count(&self, address: String) -> RpcResult<u64> {
        let addr = Address::from_hex(&address).map_err(|e| rpc_err(-32602, format!("invalid address: {e}")))?;
        self.state
            .chain
            .store()
            .get_nonce(&addr)
            .map_err(|e| rpc_err(-32603, e.to_string()))
    }

    async fn send_raw_transaction(&self, tx_hex: String) -> RpcResult<String> {
        let bytes = hex::decode(tx_hex.strip_prefix("0x").unwrap_or(&tx_hex))
            .map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;
        let tx: Transaction =
            bincode::deserialize(&bytes).map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;
        let hash = tx.hash();
        self.state
            .pool
            .admit(tx)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        Ok(hash.to_hex())
    }

    async fn get_genesis_info(&self) -> RpcResult<RpcGenesisInfo> {
        Ok(RpcGenesisInfo {
            chain_id: self.state.chain_id,
            genesis_hash: self.state.genesis_hash.to_hex(),
        })
    }
}
