use crate::error::{ChainError, ChainResult};
use crate::types::{
    u256_minimal_bytes, u64_minimal_bytes, Address, Balance, Hash, Nonce, QrSignature, SigAlg,
};
use serde::{Deserialize, Serialize};

/// A quantum transaction: every field the signing hash and the post-quantum
/// signature cover. Field order here is the canonical order of §3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub chain_id: u64,
    pub nonce: Nonce,
    pub gas_price: Balance,
    pub gas: u64,
    /// `None` means contract creation.
    pub to: Option<Address>,
    pub value: Balance,
    pub data: Vec<u8>,
    pub sig_alg: SigAlg,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
    pub kem_capsule: Option<Vec<u8>>,
}

impl Transaction {
    /// `signing_hash = Keccak256(chain_id ∥ nonce ∥ gas_price ∥ gas ∥ to? ∥
    /// value ∥ data ∥ kem_capsule?)`. Excludes `sig_alg`, `public_key`, and
    /// `signature` by construction — mutating the signature can never
    /// change this value.
    pub fn signing_hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(&u64_minimal_bytes(self.chain_id));
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&u256_minimal_bytes(self.gas_price));
        buf.extend_from_slice(&self.gas.to_be_bytes());
        if let Some(to) = &self.to {
            buf.extend_from_slice(to.as_bytes());
        }
        buf.extend_from_slice(&u256_minimal_bytes(self.value));
        buf.extend_from_slice(&self.data);
        if let Some(capsule) = &self.kem_capsule {
            buf.extend_from_slice(capsule);
        }
        Hash::keccak256(&buf)
    }

    /// `hash = Keccak256(signing_hash ∥ sig_alg ∥ signature)`.
    pub fn hash(&self) -> Hash {
        let signing_hash = self.signing_hash();
        let mut buf = Vec::with_capacity(32 + 1 + self.signature.len());
        buf.extend_from_slice(signing_hash.as_bytes());
        buf.push(self.sig_alg.tag());
        buf.extend_from_slice(&self.signature);
        Hash::keccak256(&buf)
    }

    /// `from = address_of(public_key)`.
    pub fn from_address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    pub fn signature_envelope(&self) -> QrSignature {
        QrSignature::new(self.sig_alg, self.public_key.clone(), self.signature.clone())
    }

    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }

    /// `gas * gas_price + value`, the balance a sender must hold before
    /// preflight will admit this transaction.
    pub fn max_cost(&self) -> Balance {
        self.gas_price
            .saturating_mul(Balance::from(self.gas))
            .saturating_add(self.value)
    }

    pub fn size_bytes(&self) -> ChainResult<usize> {
        bincode::serialize(self)
            .map(|b| b.len())
            .map_err(|e| ChainError::Serialization(e.to_string()))
    }

    /// Gas consumed purely by the payload: base cost plus per-byte data
    /// cost plus the creation surcharge, if any.
    pub fn intrinsic_gas(&self) -> u64 {
        use crate::constants::{
            GAS_BASE_TX, GAS_PER_CREATED_BYTE, GAS_PER_NONZERO_BYTE, GAS_PER_ZERO_BYTE,
            GAS_QUANTUM_SETUP_SURCHARGE,
        };
        let mut gas = GAS_BASE_TX;
        for &b in &self.data {
            gas += if b == 0 {
                GAS_PER_ZERO_BYTE
            } else {
                GAS_PER_NONZERO_BYTE
            };
        }
        if self.is_creation() {
            gas += GAS_QUANTUM_SETUP_SURCHARGE;
            gas += GAS_PER_CREATED_BYTE * self.data.len() as u64;
        }
        gas
    }
}
