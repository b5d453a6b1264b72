use primitive_types::U256;
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::receipt::Receipt;
use qchain_core::transaction::Transaction;
use qchain_core::types::Address;
use tracing::debug;

use crate::evm::{BlockContext, EvmExecutor};
use crate::view::StateView;

/// Preflight validation, required before any state mutation. Failure
/// here rejects the transaction from the block entirely — the block
/// that included it is itself invalid.
fn preflight(tx: &Transaction, view: &StateView<'_>) -> ChainResult<Address> {
    let from = tx.from_address();
    let nonce = view.get_nonce(&from)?;
    if nonce != tx.nonce {
        return Err(ChainError::NonceMismatch {
            expected: nonce,
            got: tx.nonce,
        });
    }
    let max_cost = tx.max_cost();
    let balance = view.get_balance(&from)?;
    if balance < max_cost {
        return Err(ChainError::InsufficientBalance {
            need: max_cost.to_string(),
            have: balance.to_string(),
        });
    }
    Ok(from)
}

/// Apply one transaction to `view`. Returns a receipt with `tx_index`,
/// `block_hash`, and `block_number` left at their zero values — the
/// caller (the block-append protocol) fills those in once the block's
/// own identity is known.
pub fn apply(
    tx: &Transaction,
    block: &BlockContext,
    view: &mut StateView<'_>,
    evm: &dyn EvmExecutor,
) -> ChainResult<Receipt> {
    let from = preflight(tx, view)?;

    // Taken before the max_cost debit: on failure this undoes the debit
    // along with any value credit, so only gas actually ends up spent.
    let checkpoint = view.checkpoint();

    let max_cost = tx.max_cost();
    let balance = view.get_balance(&from)?;
    view.set_balance(from, balance - max_cost);
    view.set_nonce(from, tx.nonce + 1);

    let mut new_contract_address = None;
    let mut creation_collision = false;

    if tx.is_creation() {
        let contract_addr = Address::create(&from, tx.nonce);
        if !view.is_empty(&contract_addr)? {
            creation_collision = true;
        } else {
            view.set_code(contract_addr, tx.data.clone());
            if !tx.value.is_zero() {
                let contract_balance = view.get_balance(&contract_addr)?;
                view.set_balance(contract_addr, contract_balance + tx.value);
            }
            new_contract_address = Some(contract_addr);
        }
    } else {
        let to = tx.to.expect("checked by is_creation");
        if !tx.value.is_zero() {
            let to_balance = view.get_balance(&to)?;
            view.set_balance(to, to_balance + tx.value);
        }
    }

    let (gas_used, status, logs, return_data) = if creation_collision {
        (tx.gas, 0u8, Vec::new(), Vec::new())
    } else {
        let outcome = evm.execute(tx, block, view, tx.gas);
        if outcome.is_success() {
            new_contract_address = new_contract_address.or(outcome.new_contract_address);
            (outcome.gas_used.min(tx.gas), 1u8, outcome.logs, outcome.return_data)
        } else {
            debug!(tx_hash = %tx.hash(), "execution failed, reverting transaction-scoped state");
            new_contract_address = None;
            (tx.gas, 0u8, Vec::new(), Vec::new())
        }
    };

    if status == 0 {
        // Unwind the max_cost debit and every value/contract effect staged
        // above; the sender still pays for gas and still consumes the nonce,
        // as if the top-level call reverted.
        view.restore(checkpoint);
        view.set_nonce(from, tx.nonce + 1);
        let balance = view.get_balance(&from)?;
        view.set_balance(from, balance - U256::from(gas_used) * tx.gas_price);
    } else {
        let refund = U256::from(tx.gas - gas_used) * tx.gas_price;
        if !refund.is_zero() {
            let from_balance = view.get_balance(&from)?;
            view.set_balance(from, from_balance + refund);
        }
    }
    let fee = U256::from(gas_used) * tx.gas_price;
    if !fee.is_zero() {
        let coinbase_balance = view.get_balance(&block.coinbase)?;
        view.set_balance(block.coinbase, coinbase_balance + fee);
    }

    Ok(Receipt {
        tx_hash: tx.hash(),
        tx_index: 0,
        block_hash: qchain_core::types::Hash::ZERO,
        block_number: 0,
        from,
        to: tx.to,
        gas_used,
        cumulative_gas_used: 0,
        contract_address: new_contract_address,
        status,
        logs,
    })
}
