use serde::{Deserialize, Serialize};

/// Wire messages exchanged over the broadcast/intake seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NetMessage {
    /// `payload` is bincode-serialized `Block`.
    NewBlock { payload: Vec<u8> },
    /// `payload` is bincode-serialized `Transaction`.
    NewTx { payload: Vec<u8> },
}

impl NetMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("NetMessage serialization is infallible")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
