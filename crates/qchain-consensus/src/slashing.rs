use std::collections::HashMap;

use primitive_types::U256;
use qchain_core::block::BlockHeader;
use qchain_core::constants::{
    DOWNTIME_MISS_THRESHOLD, JAIL_BLOCKS_DOWNTIME, JAIL_BLOCKS_INVALID_BLOCK, SLASH_DOUBLE_SIGN_BPS,
    SLASH_DOWNTIME_BPS, SLASH_INVALID_BLOCK_BPS,
};
use qchain_core::types::Address;

use crate::validator::ValidatorInfo;

/// Evidence-based slashing condition. See the module-level slashing
/// state machine: `Active -> Jailed` here, `Jailed -> Active` via
/// `ValidatorInfo::is_active` once `current_block >= jail_until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashReason {
    DoubleSign,
    InvalidBlock,
    Downtime,
}

/// Apply a slash: reduce stake by the reason's basis-point penalty and
/// jail the validator. Double-sign jails permanently (`jail_until =
/// None`); the others lift after a fixed number of blocks.
pub fn slash(validator: &mut ValidatorInfo, reason: SlashReason, current_block: u64) {
    let bps = match reason {
        SlashReason::DoubleSign => SLASH_DOUBLE_SIGN_BPS,
        SlashReason::InvalidBlock => SLASH_INVALID_BLOCK_BPS,
        SlashReason::Downtime => SLASH_DOWNTIME_BPS,
    };
    let penalty = validator.stake * U256::from(bps) / U256::from(10_000u64);
    validator.stake = validator.stake.saturating_sub(penalty);
    validator.jailed = true;
    validator.jail_until = match reason {
        SlashReason::DoubleSign => None,
        SlashReason::InvalidBlock => Some(current_block + JAIL_BLOCKS_INVALID_BLOCK),
        SlashReason::Downtime => Some(current_block + JAIL_BLOCKS_DOWNTIME),
    };
}

/// Evidence that the same validator signed two different headers for the
/// same height: same `(validator_addr, number)` and signing public key,
/// but different content. Returns the offending validator's address.
pub fn detect_double_sign(a: &BlockHeader, b: &BlockHeader) -> Option<Address> {
    if a.number != b.number || a.validator_addr != b.validator_addr {
        return None;
    }
    if a.validator_sig.public_key != b.validator_sig.public_key {
        return None;
    }
    if a.hash() == b.hash() {
        return None;
    }
    Some(a.validator_addr)
}

/// Consecutive missed-proposal streak per validator, kept by whichever node
/// is watching the chain advance. Not part of consensus state: a node's own
/// downtime count is a local liveness observation, not something blocks
/// commit to.
#[derive(Debug, Default)]
pub struct DowntimeTracker {
    misses: HashMap<Address, u64>,
}

impl DowntimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `validator` failed to produce its scheduled block.
    /// Returns `true` once `DOWNTIME_MISS_THRESHOLD` consecutive misses is
    /// reached, resetting the streak so the next slash needs a fresh run.
    pub fn record_miss(&mut self, validator: Address) -> bool {
        let count = self.misses.entry(validator).or_insert(0);
        *count += 1;
        if *count >= DOWNTIME_MISS_THRESHOLD {
            *count = 0;
            true
        } else {
            false
        }
    }

    /// Clear the streak after a validator successfully proposes.
    pub fn record_success(&mut self, validator: Address) {
        self.misses.remove(&validator);
    }
}
