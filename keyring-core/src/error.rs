use alloy_primitives::Address;
use thiserror::Error;

use crate::{events::EventError, provider::ProviderError, store::StoreError};

/// Result alias used across the keyring.
pub type KeyringResult<T, E = KeyringError> = std::result::Result<T, E>;

/// Error outputs from the keyring.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// No account is stored under the given id (or address).
    #[error("account '{0}' not found")]
    AccountNotFound(String),
    /// No pending request is stored under the given id.
    #[error("request '{0}' not found")]
    RequestNotFound(String),
    /// The provider derived an address that another account already holds.
    #[error("account address already in use: {0}")]
    DuplicateAddress(Address),
    /// The external signing provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The address recovered from a provider signature is not the claimed signer.
    #[error("signature verification failed for account '{expected}' (got '{recovered}')")]
    SignatureVerificationFailed {
        /// Address the caller asked to sign with.
        expected: Address,
        /// Address recovered from the returned signature.
        recovered: Address,
    },
    /// The requested operation is not part of the supported vocabulary.
    #[error("method '{0}' not supported")]
    UnsupportedMethod(String),
    /// Request parameters are missing or malformed.
    #[error("invalid_params: {0}")]
    InvalidParams(String),
    /// Persisting the keyring state failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// The host rejected or failed to receive a keyring event.
    #[error(transparent)]
    Event(#[from] EventError),
    /// The calling origin may not invoke the method.
    #[error("origin '{origin}' is not allowed to call '{method}'")]
    Unauthorized {
        /// Origin of the caller.
        origin: String,
        /// Method that was requested.
        method: String,
    },
    /// Unexpected error (de)serializing a payload.
    #[error("serialization_error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KeyringError {
    /// Shorthand for an [`KeyringError::InvalidParams`] error.
    pub(crate) fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams(reason.into())
    }

    /// Returns `true` for the two lookup failures.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_) | Self::RequestNotFound(_))
    }
}
