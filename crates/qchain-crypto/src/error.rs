use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Dilithium(#[from] crate::dilithium::SignatureError),
    #[error(transparent)]
    Hybrid(#[from] crate::hybrid::HybridError),
}
