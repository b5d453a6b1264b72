use primitive_types::U256;
use qchain_core::constants::{DEFAULT_MIN_GAS_PRICE, DEFAULT_POOL_CAPACITY, REPLACEMENT_BUMP_BPS};

/// Parameters governing admission, eviction, and replacement. Construct
/// with `PoolConfig::new(chain_id)` and override fields as needed; the
/// `Default` values mirror the network-wide constants.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub chain_id: u64,
    pub capacity: usize,
    pub min_gas_price: U256,
    pub replacement_bump_bps: u16,
}

impl PoolConfig {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            capacity: DEFAULT_POOL_CAPACITY,
            min_gas_price: U256::from(DEFAULT_MIN_GAS_PRICE),
            replacement_bump_bps: REPLACEMENT_BUMP_BPS,
        }
    }
}
