use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Balance / gas-price scale, 256-bit to match EVM word size.
pub type Balance = U256;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = u64;

/// Transaction sequence number per account (monotonically increasing).
pub type Nonce = u64;

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte account/contract address: trailing 20 bytes of Keccak-256(pubkey),
/// or of Keccak-256(creator_address ∥ creator_nonce) for contract creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes[..20]);
        Ok(Self(arr))
    }

    /// Derive an address from a public key: last 20 bytes of Keccak-256(pk).
    pub fn from_public_key(pk: &[u8]) -> Self {
        let digest = Keccak256::digest(pk);
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&digest[12..32]);
        Self(arr)
    }

    /// Derive a contract address from its creator and the creator's nonce
    /// at creation time: last 20 bytes of Keccak-256(creator ∥ nonce).
    pub fn create(creator: &Address, creator_nonce: Nonce) -> Self {
        let mut buf = Vec::with_capacity(20 + 8);
        buf.extend_from_slice(&creator.0);
        buf.extend_from_slice(&creator_nonce.to_be_bytes());
        let digest = Keccak256::digest(&buf);
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&digest[12..32]);
        Self(arr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}…)", &self.to_hex()[..10])
    }
}

// ── Hash ─────────────────────────────────────────────────────────────────────

/// 32-byte Keccak-256 digest: block hashes, tx hashes, state/tx/receipt roots.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn keccak256(data: &[u8]) -> Self {
        let digest = Keccak256::digest(data);
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&digest);
        Self(arr)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[..32]);
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}…)", &self.to_hex()[..10])
    }
}

/// Minimal big-endian encoding of a u256: no leading zero bytes, and zero
/// itself serializes as a single `0x00` byte. Used only inside signing-hash
/// construction, where the byte layout is bit-exact and externally specified.
pub fn u256_minimal_bytes(v: U256) -> Vec<u8> {
    if v.is_zero() {
        return vec![0u8];
    }
    let mut buf = [0u8; 32];
    v.to_big_endian(&mut buf);
    let first_nonzero = buf.iter().position(|&b| b != 0).unwrap_or(31);
    buf[first_nonzero..].to_vec()
}

/// Same minimal-encoding convention as [`u256_minimal_bytes`], for u64
/// fields (`chain_id`) that also appear inside the bit-exact signing hash.
pub fn u64_minimal_bytes(v: u64) -> Vec<u8> {
    if v == 0 {
        return vec![0u8];
    }
    let buf = v.to_be_bytes();
    let first_nonzero = buf.iter().position(|&b| b != 0).unwrap_or(7);
    buf[first_nonzero..].to_vec()
}

// ── Post-quantum signature envelope ──────────────────────────────────────────

/// Signature algorithm tag. Part of the wire envelope, excluded from the
/// transaction's signing hash.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum SigAlg {
    Dilithium = 0,
    Hybrid = 1,
}

impl SigAlg {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SigAlg::Dilithium),
            1 => Some(SigAlg::Hybrid),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Post-quantum signature envelope carried by transactions and block headers.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrSignature {
    pub algorithm: SigAlg,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl QrSignature {
    pub fn new(algorithm: SigAlg, public_key: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            algorithm,
            public_key,
            signature,
        }
    }

    /// A zeroed placeholder envelope, used while constructing `signing_hash`
    /// for a block header before the real signature is known.
    pub fn empty(algorithm: SigAlg) -> Self {
        Self {
            algorithm,
            public_key: Vec::new(),
            signature: Vec::new(),
        }
    }
}

impl fmt::Debug for QrSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QrSignature({:?}, pk={}b, sig={}b)",
            self.algorithm,
            self.public_key.len(),
            self.signature.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_from_public_key_is_deterministic() {
        let pk = b"some dilithium public key bytes";
        let a1 = Address::from_public_key(pk);
        let a2 = Address::from_public_key(pk);
        assert_eq!(a1, a2);
    }

    #[test]
    fn address_hex_round_trip() {
        let a = Address([7u8; 20]);
        let s = a.to_hex();
        assert_eq!(Address::from_hex(&s).unwrap(), a);
    }

    #[test]
    fn hash_hex_round_trip() {
        let h = Hash::keccak256(b"hello");
        let s = h.to_hex();
        assert_eq!(Hash::from_hex(&s).unwrap(), h);
    }

    #[test]
    fn u256_minimal_bytes_zero_is_one_byte() {
        assert_eq!(u256_minimal_bytes(U256::zero()), vec![0u8]);
    }

    #[test]
    fn u256_minimal_bytes_strips_leading_zeros() {
        let v = U256::from(0x1u64);
        assert_eq!(u256_minimal_bytes(v), vec![0x01]);
    }

    #[test]
    fn u64_minimal_bytes_zero_is_one_byte() {
        assert_eq!(u64_minimal_bytes(0), vec![0u8]);
    }

    #[test]
    fn create_address_differs_from_eoa_address() {
        let creator = Address([1u8; 20]);
        let c0 = Address::create(&creator, 0);
        let c1 = Address::create(&creator, 1);
        assert_ne!(c0, c1);
    }
}
