use qchain_core::types::{Address, SigAlg};
use zeroize::Zeroizing;

use crate::{dilithium, hybrid};

/// A signing keypair for one of the two supported algorithms. The secret
/// key is held in a `Zeroizing<Vec<u8>>` and wiped on drop.
pub struct KeyPair {
    pub algorithm: SigAlg,
    pub public_key: Vec<u8>,
    secret_key: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    pub fn generate(algorithm: SigAlg) -> Self {
        let (pk, sk) = match algorithm {
            SigAlg::Dilithium => dilithium::generate(),
            SigAlg::Hybrid => hybrid::generate(),
        };
        Self {
            algorithm,
            public_key: pk,
            secret_key: Zeroizing::new(sk),
        }
    }

    pub fn from_raw(algorithm: SigAlg, public_key: Vec<u8>, secret_key: Vec<u8>) -> Self {
        Self {
            algorithm,
            public_key,
            secret_key: Zeroizing::new(secret_key),
        }
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    pub fn sign(&self, message: &[u8]) -> crate::Result<Vec<u8>> {
        match self.algorithm {
            SigAlg::Dilithium => Ok(dilithium::sign(&self.secret_key, message)?),
            SigAlg::Hybrid => Ok(hybrid::sign(&self.secret_key, message)?),
        }
    }

    pub fn secret_key_bytes(&self) -> &[u8] {
        &self.secret_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ algorithm: {:?}, address: {:?} }}", self.algorithm, self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_a_pure_function_of_the_public_key() {
        let kp = KeyPair::generate(SigAlg::Dilithium);
        let a1 = kp.address();
        let a2 = Address::from_public_key(&kp.public_key);
        assert_eq!(a1, a2);
    }
}
