use qchain_core::block::Block;
use qchain_core::transaction::Transaction;
use tokio::sync::broadcast;
use tracing::debug;

use crate::message::NetMessage;

/// In-process stand-in for the external P2P transport: every handle
/// subscribes to a shared bus, and a broadcast from one handle is
/// delivered to every other handle (never echoed back to its sender).
/// A production deployment swaps this module out for real gossip
/// transport without the core crates (pool/chain/consensus) changing.
pub struct LoopbackNetwork {
    bus: broadcast::Sender<(u64, NetMessage)>,
    next_id: std::sync::atomic::AtomicU64,
}

impl LoopbackNetwork {
    pub fn new(capacity: usize) -> Self {
        let (bus, _) = broadcast::channel(capacity);
        Self {
            bus,
            next_id: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Mint a new handle, representing one node's connection to the bus.
    pub fn handle(&self) -> NetworkHandle {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        NetworkHandle {
            id,
            tx: self.bus.clone(),
            rx: self.bus.subscribe(),
        }
    }
}

impl Default for LoopbackNetwork {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A single node's view of the broadcast/intake seam (§6): `broadcast_*`
/// is the core-to-outside direction, `recv` is outside-to-core.
pub struct NetworkHandle {
    id: u64,
    tx: broadcast::Sender<(u64, NetMessage)>,
    rx: broadcast::Receiver<(u64, NetMessage)>,
}

impl NetworkHandle {
    pub fn broadcast_block(&self, block: &Block) {
        let msg = NetMessage::NewBlock {
            payload: bincode::serialize(block).expect("block serialization is infallible"),
        };
        let _ = self.tx.send((self.id, msg));
    }

    pub fn broadcast_tx(&self, tx: &Transaction) {
        let msg = NetMessage::NewTx {
            payload: bincode::serialize(tx).expect("transaction serialization is infallible"),
        };
        let _ = self.tx.send((self.id, msg));
    }

    /// Pull the next message broadcast by some other handle, skipping any
    /// of this handle's own broadcasts and tolerating slow-receiver lag.
    pub async fn recv(&mut self) -> Option<NetMessage> {
        loop {
            match self.rx.recv().await {
                Ok((sender, msg)) if sender != self.id => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "loopback network receiver lagged, dropping messages");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qchain_core::types::{Address, SigAlg};
    use qchain_core::transaction::Transaction;
    use primitive_types::U256;

    fn sample_tx() -> Transaction {
        Transaction {
            chain_id: 8888,
            nonce: 0,
            gas_price: U256::from(1u64),
            gas: 21_000,
            to: Some(Address([9u8; 20])),
            value: U256::from(1u64),
            data: vec![],
            sig_alg: SigAlg::Dilithium,
            public_key: vec![1, 2, 3],
            signature: vec![4, 5, 6],
            kem_capsule: None,
        }
    }

    #[tokio::test]
    async fn broadcast_is_delivered_to_other_handles_not_to_self() {
        let net = LoopbackNetwork::new(16);
        let sender = net.handle();
        let mut receiver = net.handle();

        sender.broadcast_tx(&sample_tx());

        let received = receiver.recv().await.unwrap();
        assert!(matches!(received, NetMessage::NewTx { .. }));
    }
}
