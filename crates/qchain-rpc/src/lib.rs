//! JSON-RPC 2.0 server for qchain nodes.
//!
//! Namespace: "qchain"
//! Methods:
//!   qchain_getBlockByNumber
//!   qchain_getBlockByHash
//!   qchain_getReceipt
//!   qchain_getBalance
//!   qchain_getTransactionCount
//!   qchain_sendRawTransaction
//!   qchain_getGenesisInfo

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState};
pub use types::{RpcBlock, RpcGenesisInfo, RpcReceipt};
