use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The genesis configuration document, as described in §6: chain id,
/// block gas limit, initial balances, and initial validator set.
/// `difficulty` is parsed and kept for wire compatibility but never
/// consulted — this core is proof-of-stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub config: ChainConfig,
    pub difficulty: String,
    #[serde(rename = "gasLimit")]
    pub gas_limit: String,
    /// Genesis block timestamp, in seconds since the epoch. Not part of
    /// the wire schema in the original genesis documents this was
    /// distilled from; defaults to 0 when omitted.
    #[serde(default)]
    pub timestamp: u64,
    pub alloc: HashMap<String, AllocEntry>,
    pub validators: Vec<ValidatorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(rename = "chainId")]
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocEntry {
    pub balance: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub storage: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub address: String,
    pub stake: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "sigAlg")]
    pub sig_alg: String,
}
