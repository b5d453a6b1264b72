use qchain_core::constants::{
    GAS_PRECOMPILE_DILITHIUM_VERIFY, GAS_PRECOMPILE_HYBRID_VERIFY, PRECOMPILE_DILITHIUM_VERIFY,
    PRECOMPILE_HYBRID_VERIFY,
};
use qchain_core::types::{QrSignature, SigAlg};

/// Static table of reserved precompile addresses, constructed once from
/// the PQ-Sig interface rather than a startup-mutated registry.
pub fn run_precompile(address_low_byte: u8, input: &[u8]) -> Option<(u64, Vec<u8>)> {
    match address_low_byte {
        PRECOMPILE_DILITHIUM_VERIFY => Some(verify_precompile(input, SigAlg::Dilithium, GAS_PRECOMPILE_DILITHIUM_VERIFY)),
        PRECOMPILE_HYBRID_VERIFY => Some(verify_precompile(input, SigAlg::Hybrid, GAS_PRECOMPILE_HYBRID_VERIFY)),
        _ => None,
    }
}

/// Input layout: `message(32) ∥ pk ∥ sig`. For Dilithium, `pk` and `sig`
/// are the fixed NIST FIPS 204 sizes; for Hybrid the remaining bytes are
/// the concatenated component layout and are handed to the crypto crate
/// as-is. Output: 32 bytes, last byte `1` iff valid.
fn verify_precompile(input: &[u8], algorithm: SigAlg, gas: u64) -> (u64, Vec<u8>) {
    let mut output = vec![0u8; 32];
    if input.len() < 32 {
        return (gas, output);
    }
    let (message, rest) = input.split_at(32);

    let valid = match algorithm {
        SigAlg::Dilithium => split_fixed(
            rest,
            qchain_core::constants::DILITHIUM2_PUBLIC_KEY_BYTES,
            qchain_core::constants::DILITHIUM2_SIGNATURE_BYTES,
        )
        .map(|(pk, sig)| {
            qchain_crypto::verify(message, &QrSignature::new(algorithm, pk.to_vec(), sig.to_vec()))
        })
        .unwrap_or(false),
        SigAlg::Hybrid => {
            // Hybrid component sizes vary only in the lattice signature;
            // the precompile trusts the caller to have split pk/sig
            // correctly by treating the whole remainder as `pk ∥ sig`
            // halves is not possible without a length prefix, so Hybrid
            // verification via this precompile requires the caller to
            // prepend a 4-byte big-endian public-key length.
            split_length_prefixed(rest)
                .map(|(pk, sig)| {
                    qchain_crypto::verify(message, &QrSignature::new(algorithm, pk.to_vec(), sig.to_vec()))
                })
                .unwrap_or(false)
        }
    };

    if valid {
        output[31] = 1;
    }
    (gas, output)
}

fn split_fixed(data: &[u8], pk_len: usize, sig_len: usize) -> Option<(&[u8], &[u8])> {
    if data.len() != pk_len + sig_len {
        return None;
    }
    Some(data.split_at(pk_len))
}

fn split_length_prefixed(data: &[u8]) -> Option<(&[u8], &[u8])> {
    if data.len() < 4 {
        return None;
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[..4]);
    let pk_len = u32::from_be_bytes(len_bytes) as usize;
    let rest = &data[4..];
    if pk_len > rest.len() {
        return None;
    }
    Some(rest.split_at(pk_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilithium_precompile_validates_a_real_signature() {
        let kp = qchain_crypto::keygen(SigAlg::Dilithium);
        let message = [7u8; 32];
        let envelope = qchain_crypto::sign(&kp, &message).unwrap();

        let mut input = message.to_vec();
        input.extend_from_slice(&envelope.public_key);
        input.extend_from_slice(&envelope.signature);

        let (gas, output) = run_precompile(PRECOMPILE_DILITHIUM_VERIFY, &input).unwrap();
        assert_eq!(gas, GAS_PRECOMPILE_DILITHIUM_VERIFY);
        assert_eq!(output[31], 1);
    }

    #[test]
    fn dilithium_precompile_rejects_tampered_signature() {
        let kp = qchain_crypto::keygen(SigAlg::Dilithium);
        let message = [7u8; 32];
        let mut envelope = qchain_crypto::sign(&kp, &message).unwrap();
        envelope.signature[0] ^= 0xff;

        let mut input = message.to_vec();
        input.extend_from_slice(&envelope.public_key);
        input.extend_from_slice(&envelope.signature);

        let (_, output) = run_precompile(PRECOMPILE_DILITHIUM_VERIFY, &input).unwrap();
        assert_eq!(output[31], 0);
    }

    #[test]
    fn unreserved_address_returns_none() {
        assert!(run_precompile(0x05, &[]).is_none());
    }
}
