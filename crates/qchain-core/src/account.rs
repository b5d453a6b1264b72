use crate::types::{Balance, Hash, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-address account state. Created lazily at first credit or first
/// storage write; `code` is set once at contract creation and is
/// immutable thereafter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Balance,
    pub nonce: u64,
    pub code: Vec<u8>,
    pub storage: HashMap<Hash, Hash>,
    /// First-touch timestamp. Informational only, not consensus-critical.
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Account {
    pub fn new_at(now: Timestamp) -> Self {
        Self {
            created_at: Some(now),
            ..Default::default()
        }
    }

    /// Zero balance, zero nonce, empty code: the definition of "empty" an
    /// account must satisfy to be overwritten by contract creation.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }

    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_is_empty() {
        assert!(Account::default().is_empty());
    }

    #[test]
    fn account_with_code_is_not_empty() {
        let mut a = Account::default();
        a.code = vec![0x60, 0x00];
        assert!(!a.is_empty());
        assert!(a.is_contract());
    }
}
