//! The only crate in the workspace that calls a cryptographic library
//! directly. Everything above treats signature and key sizes as data.

pub mod dilithium;
pub mod error;
pub mod hybrid;
pub mod keypair;

pub use error::CryptoError;
pub use keypair::KeyPair;

use qchain_core::types::{Address, QrSignature, SigAlg};

pub type Result<T> = std::result::Result<T, CryptoError>;

pub fn keygen(algorithm: SigAlg) -> KeyPair {
    KeyPair::generate(algorithm)
}

pub fn sign(keypair: &KeyPair, message: &[u8]) -> Result<QrSignature> {
    let sig_bytes = keypair.sign(message)?;
    Ok(QrSignature::new(
        keypair.algorithm,
        keypair.public_key.clone(),
        sig_bytes,
    ))
}

/// Verify a post-quantum signature envelope against `message`. Never
/// panics: malformed lengths, unknown tags, and library-reported failures
/// all fold into `false`.
pub fn verify(message: &[u8], envelope: &QrSignature) -> bool {
    match envelope.algorithm {
        SigAlg::Dilithium => dilithium::verify(&envelope.public_key, message, &envelope.signature).is_ok(),
        SigAlg::Hybrid => hybrid::verify(&envelope.public_key, message, &envelope.signature).is_ok(),
    }
}

/// Last 20 bytes of Keccak-256(public_key).
pub fn address_of(public_key: &[u8]) -> Address {
    Address::from_public_key(public_key)
}
