use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{account::Account, request::KeyringRequest};

/// Everything the keyring persists through its [`crate::StateStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringState {
    /// Accounts keyed by account id.
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
    /// Requests queued for approval, keyed by request id.
    #[serde(default)]
    pub pending_requests: BTreeMap<String, KeyringRequest>,
    /// Whether `submit_request` executes inline.
    #[serde(default)]
    pub use_sync_approvals: bool,
}

impl KeyringState {
    /// Finds the account holding `address`.
    #[must_use]
    pub fn account_by_address(&self, address: &Address) -> Option<&Account> {
        self.accounts.values().find(|account| account.address == *address)
    }

    /// Whether no account holds `address` yet.
    #[must_use]
    pub fn is_unique_address(&self, address: &Address) -> bool {
        self.account_by_address(address).is_none()
    }
}
