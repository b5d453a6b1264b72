use primitive_types::U256;
use qchain_core::constants::{BLOCK_REWARD_QUANTA, BURN_SPLIT_BPS, TREASURY_SPLIT_BPS};
use qchain_core::error::ChainResult;
use qchain_core::types::Address;
use qchain_executor::StateView;

/// Fixed sinks for the burn and treasury splits of the block reward.
/// Not reachable as a transaction sender (no keypair corresponds to
/// them); their balances are only ever credited here.
pub const BURN_SINK: Address = Address([0xEEu8; 20]);
pub const TREASURY_SINK: Address = Address([0x7Au8; 20]);

/// Distribute the block reward `R` to `coinbase`, redirecting fixed
/// fractions to the burn and treasury sinks. Splits are consensus
/// rules, not per-block parameters — different values would produce an
/// incompatible chain.
pub fn distribute_reward(view: &mut StateView<'_>, coinbase: Address) -> ChainResult<()> {
    let reward = U256::from(BLOCK_REWARD_QUANTA);
    let burn = reward * U256::from(BURN_SPLIT_BPS) / U256::from(10_000u64);
    let treasury = reward * U256::from(TREASURY_SPLIT_BPS) / U256::from(10_000u64);
    let coinbase_share = reward - burn - treasury;

    let coinbase_balance = view.get_balance(&coinbase)?;
    view.set_balance(coinbase, coinbase_balance + coinbase_share);

    let burn_balance = view.get_balance(&BURN_SINK)?;
    view.set_balance(BURN_SINK, burn_balance + burn);

    let treasury_balance = view.get_balance(&TREASURY_SINK)?;
    view.set_balance(TREASURY_SINK, treasury_balance + treasury);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qchain_state::{StateBuffer, StateStore};

    fn open_temp(name: &str) -> StateStore {
        let dir = std::env::temp_dir().join(format!("qchain_consensus_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        StateStore::open(&dir).unwrap()
    }

    #[test]
    fn reward_splits_across_coinbase_burn_and_treasury() {
        let store = open_temp("reward_split");
        let mut buffer = StateBuffer::new();
        let mut view = StateView::new(&mut buffer, &store);
        let coinbase = Address([1u8; 20]);

        distribute_reward(&mut view, coinbase).unwrap();

        let total = view.get_balance(&coinbase).unwrap()
            + view.get_balance(&BURN_SINK).unwrap()
            + view.get_balance(&TREASURY_SINK).unwrap();
        assert_eq!(total, U256::from(BLOCK_REWARD_QUANTA));
        assert!(view.get_balance(&BURN_SINK).unwrap() > U256::zero());
        assert!(view.get_balance(&TREASURY_SINK).unwrap() > U256::zero());
    }
}
