use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use strum::IntoEnumIterator;

use super::KeyringRpcMethod;
use crate::{
    config::KeyringConfig,
    error::{KeyringError, KeyringResult},
};

/// Methods the host runtime itself may call.
pub const HOST_METHODS: [KeyringRpcMethod; 8] = [
    KeyringRpcMethod::ListAccounts,
    KeyringRpcMethod::GetAccount,
    KeyringRpcMethod::FilterAccountChains,
    KeyringRpcMethod::DeleteAccount,
    KeyringRpcMethod::ListRequests,
    KeyringRpcMethod::GetRequest,
    KeyringRpcMethod::SubmitRequest,
    KeyringRpcMethod::RejectRequest,
];

/// Per-origin allow-list of RPC methods.
#[derive(Debug, Clone, Default)]
pub struct OriginPermissions {
    origins: HashMap<String, HashSet<KeyringRpcMethod>>,
}

impl OriginPermissions {
    /// An allow-list granting nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `methods` to `origin`, in addition to anything already granted.
    #[must_use]
    pub fn allow(
        mut self,
        origin: impl Into<String>,
        methods: impl IntoIterator<Item = KeyringRpcMethod>,
    ) -> Self {
        self.origins
            .entry(origin.into())
            .or_default()
            .extend(methods);
        self
    }

    /// Default policy: the host gets [`HOST_METHODS`], every companion dapp
    /// origin gets every method.
    #[must_use]
    pub fn from_config(config: &KeyringConfig) -> Self {
        config.dapp_origins().fold(
            Self::new().allow(config.host_origin.clone(), HOST_METHODS),
            |permissions, origin| permissions.allow(origin, KeyringRpcMethod::iter()),
        )
    }

    /// Whether `origin` may call `method`.
    #[must_use]
    pub fn is_allowed(&self, origin: &str, method: KeyringRpcMethod) -> bool {
        self.origins
            .get(origin)
            .is_some_and(|methods| methods.contains(&method))
    }

    /// Resolves `method` and checks it against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::Unauthorized`] for unknown methods and for
    /// methods not granted to `origin`.
    pub fn check(&self, origin: &str, method: &str) -> KeyringResult<KeyringRpcMethod> {
        KeyringRpcMethod::from_str(method)
            .ok()
            .filter(|resolved| self.is_allowed(origin, *resolved))
            .ok_or_else(|| KeyringError::Unauthorized {
                origin: origin.to_string(),
                method: method.to_string(),
            })
    }
}
