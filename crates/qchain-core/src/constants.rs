//! ─── QChain Protocol Constants ──────────────────────────────────────────────
//!
//! Native unit: Quanta  (1 QTM = 1_000_000_000 Quanta)
//! Ticker:      QTM

// ── Network ──────────────────────────────────────────────────────────────────

/// Chain id every transaction and block header must carry.
pub const CHAIN_ID: u64 = 8888;

/// 1 QTM expressed in Quanta.
pub const QUANTA_PER_QTM: u128 = 1_000_000_000;

// ── Block production ─────────────────────────────────────────────────────────

/// Fixed block cadence.
pub const BLOCK_INTERVAL_SECS: u64 = 2;

/// Soft deadline for building and signing a block within one interval.
pub const BLOCK_BUILD_DEADLINE_SECS: f64 = 1.5;

/// Maximum bytes for `BlockHeader::extra`.
pub const MAX_EXTRA_DATA_BYTES: usize = 256;

// ── Validator set ─────────────────────────────────────────────────────────────

pub const MIN_VALIDATOR_SET_SIZE: usize = 1;
pub const MAX_VALIDATOR_SET_SIZE: usize = 21;

/// Commission cap: 20%, expressed in basis points.
pub const MAX_COMMISSION_BPS: u16 = 2000;

// ── Slashing ──────────────────────────────────────────────────────────────────

/// Double-sign penalty, basis points of stake.
pub const SLASH_DOUBLE_SIGN_BPS: u16 = 2000;
/// Invalid-block penalty, basis points of stake.
pub const SLASH_INVALID_BLOCK_BPS: u16 = 1000;
/// Downtime penalty, basis points of stake.
pub const SLASH_DOWNTIME_BPS: u16 = 100;

/// Jail duration (in blocks) for an invalid-block slash.
pub const JAIL_BLOCKS_INVALID_BLOCK: u64 = 100;
/// Jail duration (in blocks) for a downtime slash.
pub const JAIL_BLOCKS_DOWNTIME: u64 = 50;
/// Number of consecutive missed proposal slots that triggers a downtime slash.
pub const DOWNTIME_MISS_THRESHOLD: u64 = 10;

// ── Block reward & fee splits ─────────────────────────────────────────────────

/// Block reward minted to the coinbase, in Quanta.
pub const BLOCK_REWARD_QUANTA: u128 = 2 * QUANTA_PER_QTM;
/// Fraction of the block reward redirected to the burn sink (basis points).
pub const BURN_SPLIT_BPS: u16 = 3000;
/// Fraction of the block reward redirected to the treasury sink (basis points).
pub const TREASURY_SPLIT_BPS: u16 = 1000;

// ── Gas accounting ────────────────────────────────────────────────────────────

pub const GAS_BASE_TX: u64 = 21_000;
pub const GAS_PER_ZERO_BYTE: u64 = 4;
pub const GAS_PER_NONZERO_BYTE: u64 = 16;
pub const GAS_PER_CREATED_BYTE: u64 = 200;
pub const GAS_QUANTUM_SETUP_SURCHARGE: u64 = 5_000;

/// Fixed gas charged by the Dilithium-verify precompile (0x0a).
/// Chosen at the low end of the spec's [800, 50_000] range.
pub const GAS_PRECOMPILE_DILITHIUM_VERIFY: u64 = 800;
/// Fixed gas charged by the Hybrid-verify precompile (0x0b).
pub const GAS_PRECOMPILE_HYBRID_VERIFY: u64 = 1_600;

// ── Transaction pool ──────────────────────────────────────────────────────────

/// Maximum serialized transaction size.
pub const MAX_TX_SIZE_BYTES: usize = 32 * 1024;
/// Default pool capacity (transaction count).
pub const DEFAULT_POOL_CAPACITY: usize = 5_000;
/// Minimum accepted gas price, in Quanta.
pub const DEFAULT_MIN_GAS_PRICE: u128 = 1;
/// A replacement transaction must raise gas_price by at least this many
/// basis points over the existing one at the same (sender, nonce).
pub const REPLACEMENT_BUMP_BPS: u16 = 1000;

// ── Reserved precompile addresses ─────────────────────────────────────────────

pub const PRECOMPILE_DILITHIUM_VERIFY: u8 = 0x0a;
pub const PRECOMPILE_HYBRID_VERIFY: u8 = 0x0b;

// ── Algorithm sizes (Dilithium-II, per NIST FIPS 204) ─────────────────────────

pub const DILITHIUM2_PUBLIC_KEY_BYTES: usize = 1312;
pub const DILITHIUM2_SIGNATURE_BYTES: usize = 2420;
