pub mod config;
pub mod message;
pub mod network;

pub use config::NetConfig;
pub use message::NetMessage;
pub use network::{LoopbackNetwork, NetworkHandle};
