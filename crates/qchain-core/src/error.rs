use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    // ── Malformed input ──────────────────────────────────────────────────────
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("transaction exceeds max size: {size} > {max}")]
    TransactionTooLarge { size: usize, max: usize },

    #[error("extra data exceeds max size: {size} > {max}")]
    ExtraDataTooLarge { size: usize, max: usize },

    #[error("unrecognized signature algorithm tag: {0}")]
    UnknownSigAlg(u8),

    // ── Signature errors ─────────────────────────────────────────────────────
    #[error("signature invalid")]
    SignatureInvalid,

    #[error("declared sender does not match address_of(public_key)")]
    SenderMismatch,

    // ── Pool / nonce / balance errors ────────────────────────────────────────
    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: String, have: String },

    #[error("pool is full (capacity {capacity})")]
    PoolFull { capacity: usize },

    #[error("duplicate transaction: {0}")]
    Duplicate(String),

    #[error("chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch { expected: u64, got: u64 },

    #[error("gas price {got} below minimum {min}")]
    GasPriceTooLow { got: String, min: String },

    // ── Block / chain errors ─────────────────────────────────────────────────
    #[error("block invalid: {0}")]
    BlockInvalid(String),

    #[error("consensus violation: {0}")]
    ConsensusViolation(String),

    #[error("unknown block: {0}")]
    UnknownBlock(String),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("code already set for account {0}; contract code is immutable")]
    CodeAlreadyWritten(String),

    #[error("genesis already applied; stored hash {stored} does not match configured hash {configured}")]
    GenesisMismatch { stored: String, configured: String },

    // ── Validator / consensus set errors ─────────────────────────────────────
    #[error("validator not found: {0}")]
    UnknownValidator(String),

    #[error("validator set size {got} outside allowed range [{min}, {max}]")]
    ValidatorSetSizeOutOfRange { got: usize, min: usize, max: usize },

    #[error("duplicate validator address: {0}")]
    DuplicateValidator(String),

    #[error("validator is jailed: {0}")]
    ValidatorJailed(String),

    // ── Storage ───────────────────────────────────────────────────────────────
    #[error("storage corruption: {0}")]
    StorageCorruption(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

pub type ChainResult<T> = Result<T, ChainError>;
