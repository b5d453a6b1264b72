use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
}

/// Generate a fresh Dilithium2 keypair: `(public_key_bytes, secret_key_bytes)`.
pub fn generate() -> (Vec<u8>, Vec<u8>) {
    let (pk, sk) = dilithium2::keypair();
    (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
}

pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let sk = dilithium2::SecretKey::from_bytes(secret_key_bytes)
        .map_err(|e| SignatureError::InvalidSecretKey(e.to_string()))?;
    let sig = dilithium2::detached_sign(message, &sk);
    Ok(sig.as_bytes().to_vec())
}

/// Verify a detached Dilithium2 signature. Malformed public keys or
/// signatures are reported as `Err`, never a panic — callers fold this
/// into a plain `bool` at the call site.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let pk = dilithium2::PublicKey::from_bytes(public_key)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;
    let sig = dilithium2::DetachedSignature::from_bytes(signature)
        .map_err(|_| SignatureError::InvalidSignature)?;
    dilithium2::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| SignatureError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let (pk, sk) = generate();
        let msg = b"quantum-safe promise";
        let sig = sign(&sk, msg).unwrap();
        assert!(verify(&pk, msg, &sig).is_ok());
    }

    #[test]
    fn tampered_message_fails() {
        let (pk, sk) = generate();
        let sig = sign(&sk, b"original").unwrap();
        assert!(verify(&pk, b"tampered", &sig).is_err());
    }

    #[test]
    fn malformed_public_key_is_an_error_not_a_panic() {
        let (_, sk) = generate();
        let sig = sign(&sk, b"m").unwrap();
        assert!(verify(&[1, 2, 3], b"m", &sig).is_err());
    }
}
