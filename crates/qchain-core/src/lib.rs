pub mod account;
pub mod block;
pub mod constants;
pub mod error;
pub mod receipt;
pub mod transaction;
pub mod types;

pub use account::Account;
pub use block::{Block, BlockHeader};
pub use error::{ChainError, ChainResult};
pub use receipt::{Log, Receipt};
pub use transaction::Transaction;
pub use types::{Address, Balance, Hash, Nonce, QrSignature, SigAlg, Timestamp};
