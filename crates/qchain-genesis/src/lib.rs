pub mod hexutil;
pub mod params;

use qchain_consensus::{ValidatorInfo, ValidatorSet};
use qchain_core::block::{Block, BlockHeader};
use qchain_core::error::{ChainError, ChainResult};
use qchain_core::types::{Address, Hash, SigAlg};
use qchain_state::StateStore;
use tracing::info;

pub use params::{AllocEntry, ChainConfig, GenesisConfig, ValidatorEntry};

fn parse_sig_alg(s: &str) -> ChainResult<SigAlg> {
    match s.to_ascii_lowercase().as_str() {
        "dilithium" => Ok(SigAlg::Dilithium),
        "hybrid" => Ok(SigAlg::Hybrid),
        other => Err(ChainError::MalformedInput(format!(
            "unrecognized sigAlg '{other}'"
        ))),
    }
}

fn build_genesis_header(config: &GenesisConfig, validators: &ValidatorSet) -> ChainResult<BlockHeader> {
    let gas_limit = hexutil::parse_hex_u64(&config.gas_limit)?;
    let coinbase = validators
        .validators()
        .first()
        .map(|v| v.address)
        .unwrap_or(Address::ZERO);
    Ok(Block::unsigned_header(
        Hash::ZERO,
        Hash::ZERO,
        Hash::ZERO,
        Hash::ZERO,
        coinbase,
        coinbase,
        0,
        gas_limit,
        0,
        config.timestamp,
        Vec::new(),
        SigAlg::Dilithium,
    ))
}

/// Write every `alloc` entry directly into the state store, bypassing the
/// executor: genesis accounts have no signature, no parent, no nonce to
/// check against.
fn apply_alloc(store: &StateStore, config: &GenesisConfig) -> ChainResult<()> {
    for (addr_hex, entry) in &config.alloc {
        let addr = Address::from_hex(addr_hex).map_err(ChainError::InvalidHex)?;
        let balance = hexutil::parse_hex_u256(&entry.balance)?;
        store.set_balance(&addr, balance)?;
        if let Some(code_hex) = &entry.code {
            let code = hexutil::parse_hex_bytes(code_hex)?;
            if !code.is_empty() {
                store.set_code(&addr, code)?;
            }
        }
        if let Some(storage) = &entry.storage {
            for (key_hex, value_hex) in storage {
                let key = Hash::from_hex(key_hex).map_err(ChainError::InvalidHex)?;
                let value = Hash::from_hex(value_hex).map_err(ChainError::InvalidHex)?;
                store.set_storage(&addr, &key, value)?;
            }
        }
    }
    Ok(())
}

fn build_validator_set(config: &GenesisConfig) -> ChainResult<ValidatorSet> {
    let mut validators = Vec::with_capacity(config.validators.len());
    for entry in &config.validators {
        let address = Address::from_hex(&entry.address).map_err(ChainError::InvalidHex)?;
        let public_key = hexutil::parse_hex_bytes(&entry.public_key)?;
        let stake = hexutil::parse_hex_u256(&entry.stake)?;
        let sig_alg = parse_sig_alg(&entry.sig_alg)?;
        validators.push(ValidatorInfo {
            address,
            public_key,
            sig_alg,
            stake,
            last_active: 0,
            jailed: false,
            jail_until: None,
            commission_bps: 0,
        });
    }
    ValidatorSet::new(validators)
}

/// Apply the genesis document to `store`. Idempotent: if genesis was
/// already applied, this only verifies that the stored genesis hash
/// matches the one this document would produce, and returns the existing
/// block and a freshly rebuilt validator set rather than re-writing state.
pub fn apply_genesis(store: &StateStore, config: &GenesisConfig) -> ChainResult<(Block, ValidatorSet)> {
    let validators = build_validator_set(config)?;
    let header = build_genesis_header(config, &validators)?;
    let block = Block {
        header,
        transactions: Vec::new(),
    };
    let computed_hash = block.hash();

    if let Some(stored_hash) = store.get_genesis_hash()? {
        if stored_hash != computed_hash {
            return Err(ChainError::GenesisMismatch {
                stored: stored_hash.to_hex(),
                configured: computed_hash.to_hex(),
            });
        }
        info!(hash = %computed_hash, "genesis already applied, configuration matches");
        return Ok((block, validators));
    }

    apply_alloc(store, config)?;
    store.put_block(&block)?;
    store.set_genesis_hash(computed_hash)?;
    store.set_current_head(computed_hash)?;
    store.flush()?;

    info!(hash = %computed_hash, chain_id = config.config.chain_id, validators = validators.len(), "genesis applied");
    Ok((block, validators))
}
