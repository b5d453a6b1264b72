use crate::dilithium;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

pub const ED25519_PUBLIC_KEY_BYTES: usize = 32;
pub const ED25519_SIGNATURE_BYTES: usize = 64;

#[derive(Debug, Error)]
pub enum HybridError {
    #[error("hybrid public key too short: need at least {need}, got {got}")]
    PublicKeyTooShort { need: usize, got: usize },
    #[error("hybrid signature too short: need at least {need}, got {got}")]
    SignatureTooShort { need: usize, got: usize },
    #[error("classical component invalid: {0}")]
    ClassicalInvalid(String),
    #[error("lattice component invalid: {0}")]
    LatticeInvalid(#[from] dilithium::SignatureError),
}

/// Generate a fresh hybrid keypair. The concatenated public key layout is
/// `ed25519_pk(32) ∥ dilithium_pk(1312)`; the secret material returned is
/// `ed25519_sk(32) ∥ dilithium_sk`, at the same fixed offset.
pub fn generate() -> (Vec<u8>, Vec<u8>) {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    let (dilithium_pk, dilithium_sk) = dilithium::generate();

    let mut pk = Vec::with_capacity(ED25519_PUBLIC_KEY_BYTES + dilithium_pk.len());
    pk.extend_from_slice(signing_key.verifying_key().as_bytes());
    pk.extend_from_slice(&dilithium_pk);

    let mut sk = Vec::with_capacity(ED25519_PUBLIC_KEY_BYTES + dilithium_sk.len());
    sk.extend_from_slice(&signing_key.to_bytes());
    sk.extend_from_slice(&dilithium_sk);

    (pk, sk)
}

/// Sign with both components; the concatenated signature layout is
/// `ed25519_sig(64) ∥ dilithium_sig(2420)`.
pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<Vec<u8>, HybridError> {
    if secret_key_bytes.len() < ED25519_PUBLIC_KEY_BYTES {
        return Err(HybridError::SignatureTooShort {
            need: ED25519_PUBLIC_KEY_BYTES,
            got: secret_key_bytes.len(),
        });
    }
    let (ed25519_sk, dilithium_sk) = secret_key_bytes.split_at(ED25519_PUBLIC_KEY_BYTES);
    let mut ed25519_sk_arr = [0u8; 32];
    ed25519_sk_arr.copy_from_slice(ed25519_sk);
    let signing_key = SigningKey::from_bytes(&ed25519_sk_arr);
    let ed_sig = signing_key.sign(message);

    let dilithium_sig = dilithium::sign(dilithium_sk, message)?;

    let mut sig = Vec::with_capacity(ED25519_SIGNATURE_BYTES + dilithium_sig.len());
    sig.extend_from_slice(&ed_sig.to_bytes());
    sig.extend_from_slice(&dilithium_sig);
    Ok(sig)
}

/// Verify both components; both MUST verify for the composite to be valid.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), HybridError> {
    if public_key.len() <= ED25519_PUBLIC_KEY_BYTES {
        return Err(HybridError::PublicKeyTooShort {
            need: ED25519_PUBLIC_KEY_BYTES + 1,
            got: public_key.len(),
        });
    }
    if signature.len() <= ED25519_SIGNATURE_BYTES {
        return Err(HybridError::SignatureTooShort {
            need: ED25519_SIGNATURE_BYTES + 1,
            got: signature.len(),
        });
    }
    let (ed25519_pk, dilithium_pk) = public_key.split_at(ED25519_PUBLIC_KEY_BYTES);
    let (ed25519_sig, dilithium_sig) = signature.split_at(ED25519_SIGNATURE_BYTES);

    let mut pk_arr = [0u8; 32];
    pk_arr.copy_from_slice(ed25519_pk);
    let verifying_key =
        VerifyingKey::from_bytes(&pk_arr).map_err(|e| HybridError::ClassicalInvalid(e.to_string()))?;
    let mut sig_arr = [0u8; 64];
    sig_arr.copy_from_slice(ed25519_sig);
    let ed_sig = ed25519_dalek::Signature::from_bytes(&sig_arr);
    verifying_key
        .verify(message, &ed_sig)
        .map_err(|e| HybridError::ClassicalInvalid(e.to_string()))?;

    dilithium::verify(dilithium_pk, message, dilithium_sig)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hybrid_sign_verify_round_trip() {
        let (pk, sk) = generate();
        let msg = b"classical and lattice agree";
        let sig = sign(&sk, msg).unwrap();
        assert!(verify(&pk, msg, &sig).is_ok());
    }

    #[test]
    fn hybrid_rejects_when_classical_component_fails() {
        let (pk, sk) = generate();
        let mut sig = sign(&sk, b"message").unwrap();
        sig[0] ^= 0xff;
        assert!(verify(&pk, b"message", &sig).is_err());
    }

    #[test]
    fn hybrid_rejects_when_lattice_component_fails() {
        let (pk, sk) = generate();
        let mut sig = sign(&sk, b"message").unwrap();
        let last = sig.len() - 1;
        sig[last] ^= 0xff;
        assert!(verify(&pk, b"message", &sig).is_err());
    }
}
