pub mod buffer;
pub mod store;

pub use buffer::{StateBuffer, StateBufferCheckpoint};
pub use store::StateStore;
