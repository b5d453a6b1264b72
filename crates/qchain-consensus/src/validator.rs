use primitive_types::U256;
use qchain_core::constants::{MAX_COMMISSION_BPS, MAX_VALIDATOR_SET_SIZE, MIN_VALIDATOR_SET_SIZE};
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::types::{Address, SigAlg};
use serde::{Deserialize, Serialize};

/// Information about a single validator. Fixed at genesis; only
/// `stake`, `jailed`, `jail_until`, and `last_active` change after that,
/// via slashing and activity tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub address: Address,
    pub public_key: Vec<u8>,
    pub sig_alg: SigAlg,
    pub stake: U256,
    pub last_active: u64,
    pub jailed: bool,
    /// Block number at which a temporary jail lifts. `None` for a
    /// permanent jail (double-sign) or while not jailed.
    pub jail_until: Option<u64>,
    pub commission_bps: u16,
}

impl ValidatorInfo {
    pub fn is_active(&self, current_block: u64) -> bool {
        if !self.jailed {
            return true;
        }
        match self.jail_until {
            Some(until) => current_block >= until,
            None => false,
        }
    }
}

/// The validator set: fixed membership, addresses unique, size in
/// `[MIN_VALIDATOR_SET_SIZE, MAX_VALIDATOR_SET_SIZE]`. Stored sorted by
/// address ascending, which is also the proposer-rotation order.
#[derive(Debug, Clone)]
pub struct ValidatorSet {
    validators: Vec<ValidatorInfo>,
}

impl ValidatorSet {
    pub fn new(mut validators: Vec<ValidatorInfo>) -> ChainResult<Self> {
        if validators.len() < MIN_VALIDATOR_SET_SIZE || validators.len() > MAX_VALIDATOR_SET_SIZE {
            return Err(ChainError::ValidatorSetSizeOutOfRange {
                got: validators.len(),
                min: MIN_VALIDATOR_SET_SIZE,
                max: MAX_VALIDATOR_SET_SIZE,
            });
        }
        for v in &validators {
            if v.stake.is_zero() {
                return Err(ChainError::ConsensusViolation(format!(
                    "validator {} has zero stake",
                    v.address
                )));
            }
            if v.commission_bps > MAX_COMMISSION_BPS {
                return Err(ChainError::ConsensusViolation(format!(
                    "validator {} commission {} exceeds max {}",
                    v.address, v.commission_bps, MAX_COMMISSION_BPS
                )));
            }
        }
        validators.sort_by_key(|v| v.address);
        for pair in validators.windows(2) {
            if pair[0].address == pair[1].address {
                return Err(ChainError::DuplicateValidator(pair[0].address.to_hex()));
            }
        }
        Ok(Self { validators })
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn get(&self, address: &Address) -> Option<&ValidatorInfo> {
        self.validators.iter().find(|v| &v.address == address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut ValidatorInfo> {
        self.validators.iter_mut().find(|v| &v.address == address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.get(address).is_some()
    }

    pub fn total_stake(&self) -> U256 {
        self.validators
            .iter()
            .fold(U256::zero(), |acc, v| acc + v.stake)
    }

    /// Deterministic round-robin: `validators[number mod len]`, where
    /// `validators` is sorted by address ascending.
    pub fn proposer_for(&self, number: u64) -> Address {
        let idx = (number as usize) % self.validators.len();
        self.validators[idx].address
    }

    pub fn validators(&self) -> &[ValidatorInfo] {
        &self.validators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(byte: u8, stake: u64) -> ValidatorInfo {
        ValidatorInfo {
            address: Address([byte; 20]),
            public_key: vec![byte; 4],
            sig_alg: SigAlg::Dilithium,
            stake: U256::from(stake),
            last_active: 0,
            jailed: false,
            jail_until: None,
            commission_bps: 0,
        }
    }

    #[test]
    fn proposer_rotates_deterministically_by_sorted_address() {
        let set = ValidatorSet::new(vec![validator(3, 10), validator(1, 10), validator(2, 10)]).unwrap();
        assert_eq!(set.proposer_for(0), Address([1u8; 20]));
        assert_eq!(set.proposer_for(1), Address([2u8; 20]));
        assert_eq!(set.proposer_for(2), Address([3u8; 20]));
        assert_eq!(set.proposer_for(3), Address([1u8; 20]));
    }

    #[test]
    fn rejects_duplicate_addresses() {
        let err = ValidatorSet::new(vec![validator(1, 10), validator(1, 20)]).unwrap_err();
        assert!(matches!(err, ChainError::DuplicateValidator(_)));
    }

    #[test]
    fn rejects_oversized_set() {
        let validators: Vec<ValidatorInfo> = (0..22u8).map(|i| validator(i, 10)).collect();
        let err = ValidatorSet::new(validators).unwrap_err();
        assert!(matches!(err, ChainError::ValidatorSetSizeOutOfRange { .. }));
    }

    #[test]
    fn jailed_without_jail_until_is_never_active() {
        let mut v = validator(1, 10);
        v.jailed = true;
        assert!(!v.is_active(1_000_000));
    }

    #[test]
    fn jailed_with_jail_until_reactivates_after_threshold() {
        let mut v = validator(1, 10);
        v.jailed = true;
        v.jail_until = Some(100);
        assert!(!v.is_active(99));
        assert!(v.is_active(100));
    }
}
