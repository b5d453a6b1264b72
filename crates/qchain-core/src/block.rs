use crate::constants::MAX_EXTRA_DATA_BYTES;
use crate::error::{ChainError, ChainResult};
use crate::transaction::Transaction;
use crate::types::{Address, Hash, QrSignature, SigAlg, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub parent_hash: Hash,
    pub state_root: Hash,
    pub tx_root: Hash,
    pub receipt_root: Hash,
    pub coinbase: Address,
    pub validator_addr: Address,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: Timestamp,
    pub extra: Vec<u8>,
    pub validator_sig: QrSignature,
}

impl BlockHeader {
    /// `Keccak256(all fields except validator_sig)`. The signature is
    /// computed over this value, never over `hash()`.
    pub fn signing_hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.parent_hash.as_bytes());
        buf.extend_from_slice(self.state_root.as_bytes());
        buf.extend_from_slice(self.tx_root.as_bytes());
        buf.extend_from_slice(self.receipt_root.as_bytes());
        buf.extend_from_slice(self.coinbase.as_bytes());
        buf.extend_from_slice(self.validator_addr.as_bytes());
        buf.extend_from_slice(&self.number.to_be_bytes());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.gas_used.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.extra);
        Hash::keccak256(&buf)
    }

    /// `Keccak256(all fields including validator_sig)`: the header's own
    /// identity, used as `parent_hash` of the next block and as the key
    /// this block is stored under.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.signing_hash().as_bytes());
        buf.push(self.validator_sig.algorithm.tag());
        buf.extend_from_slice(&self.validator_sig.public_key);
        buf.extend_from_slice(&self.validator_sig.signature);
        Hash::keccak256(&buf)
    }

    pub fn validate_extra_size(&self) -> ChainResult<()> {
        if self.extra.len() > MAX_EXTRA_DATA_BYTES {
            return Err(ChainError::ExtraDataTooLarge {
                size: self.extra.len(),
                max: MAX_EXTRA_DATA_BYTES,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Merkle root of transaction hashes: pairwise Keccak-256, duplicating
    /// the odd tail at each level, until one root remains. An empty list
    /// yields the zero hash.
    pub fn merkle_root(tx_hashes: &[Hash]) -> Hash {
        if tx_hashes.is_empty() {
            return Hash::ZERO;
        }
        let mut level: Vec<Hash> = tx_hashes.to_vec();
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut i = 0;
            while i < level.len() {
                let left = level[i];
                let right = if i + 1 < level.len() { level[i + 1] } else { level[i] };
                let mut buf = Vec::with_capacity(64);
                buf.extend_from_slice(left.as_bytes());
                buf.extend_from_slice(right.as_bytes());
                next.push(Hash::keccak256(&buf));
                i += 2;
            }
            level = next;
        }
        level[0]
    }

    pub fn tx_root(&self) -> Hash {
        let hashes: Vec<Hash> = self.transactions.iter().map(Transaction::hash).collect();
        Self::merkle_root(&hashes)
    }

    /// A template header for signing: every field filled except
    /// `validator_sig`, which callers set after computing `signing_hash`.
    pub fn unsigned_header(
        parent_hash: Hash,
        state_root: Hash,
        tx_root: Hash,
        receipt_root: Hash,
        coinbase: Address,
        validator_addr: Address,
        number: u64,
        gas_limit: u64,
        gas_used: u64,
        timestamp: Timestamp,
        extra: Vec<u8>,
        sig_alg: SigAlg,
    ) -> BlockHeader {
        BlockHeader {
            parent_hash,
            state_root,
            tx_root,
            receipt_root,
            coinbase,
            validator_addr,
            number,
            gas_limit,
            gas_used,
            timestamp,
            extra,
            validator_sig: QrSignature::empty(sig_alg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(sig: QrSignature) -> BlockHeader {
        BlockHeader {
            parent_hash: Hash::ZERO,
            state_root: Hash::ZERO,
            tx_root: Hash::ZERO,
            receipt_root: Hash::ZERO,
            coinbase: Address::ZERO,
            validator_addr: Address::ZERO,
            number: 1,
            gas_limit: 10_000_000,
            gas_used: 0,
            timestamp: 1,
            extra: vec![],
            validator_sig: sig,
        }
    }

    #[test]
    fn signing_hash_invariant_under_validator_sig_change() {
        let h1 = header(QrSignature::new(SigAlg::Dilithium, vec![1], vec![2]));
        let h2 = header(QrSignature::new(SigAlg::Dilithium, vec![9, 9], vec![8, 8, 8]));
        assert_eq!(h1.signing_hash(), h2.signing_hash());
        assert_ne!(h1.hash(), h2.hash());
    }

    #[test]
    fn empty_block_tx_root_is_zero_hash() {
        let block = Block {
            header: header(QrSignature::empty(SigAlg::Dilithium)),
            transactions: vec![],
        };
        assert_eq!(block.tx_root(), Hash::ZERO);
    }

    #[test]
    fn merkle_root_duplicates_odd_tail() {
        let a = Hash::keccak256(b"a");
        let b = Hash::keccak256(b"b");
        let c = Hash::keccak256(b"c");
        let three = Block::merkle_root(&[a, b, c]);

        let mut buf = Vec::new();
        buf.extend_from_slice(c.as_bytes());
        buf.extend_from_slice(c.as_bytes());
        let cc = Hash::keccak256(&buf);
        let mut buf2 = Vec::new();
        buf2.extend_from_slice(a.as_bytes());
        buf2.extend_from_slice(b.as_bytes());
        let ab = Hash::keccak256(&buf2);
        let mut buf3 = Vec::new();
        buf3.extend_from_slice(ab.as_bytes());
        buf3.extend_from_slice(cc.as_bytes());
        let expected = Hash::keccak256(&buf3);

        assert_eq!(three, expected);
    }
}
