//! Interface to the external MPC / custodial wallet provider.
//!
//! The keyring never holds private key material. Identity, sessions, wallet
//! creation and the signatures themselves all round-trip through a
//! [`SigningProvider`] supplied by the embedder.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signing::TransactionRequest;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Opaque failure raised by a [`SigningProvider`] implementation.
#[derive(Debug, Error)]
#[error("provider_error: {message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    /// Creates a provider error from a human-readable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The underlying cause as reported by the provider.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A wallet as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderWallet {
    /// Provider-side wallet identifier used when requesting signatures.
    pub id: String,
    /// Address controlled by the wallet.
    pub address: Address,
}

/// Identity and session material forwarded to the provider.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    /// Provider user id.
    pub user_id: Option<String>,
    /// Email the user authenticated with.
    pub email: Option<String>,
    /// Session cookie relayed by the companion dapp.
    pub session_cookie: Option<SecretString>,
}

impl SessionCredentials {
    /// Whether the credentials carry re-authentication material.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session_cookie.is_some()
    }
}

/// Result of asking the provider to create a wallet.
#[derive(Debug, Default)]
pub struct CreatedWallet {
    /// One-time recovery secret, when the provider issues one.
    pub recovery_secret: Option<SecretString>,
}

/// Raw transaction signature as returned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSignature {
    /// `r` component.
    pub r: U256,
    /// `s` component.
    pub s: U256,
    /// Recovery value as produced by the provider (`27/28`, or EIP-155 encoded).
    pub v: u64,
}

/// The external wallet SDK performing every key operation.
///
/// Implementations must be `init`ialized before any call that touches
/// wallets or signing; [`crate::AccountKeyring::init`] takes care of that.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// Prepares the provider (loads session storage, spins up signing workers).
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be brought up.
    async fn init(&self) -> ProviderResult<()>;

    /// Whether the user session is fully authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the session state cannot be determined.
    async fn is_fully_logged_in(&self) -> ProviderResult<bool>;

    /// Installs identity and session material on the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the material.
    async fn set_session(&self, credentials: &SessionCredentials) -> ProviderResult<()>;

    /// Re-runs identity confirmation against the provider's backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be confirmed.
    async fn confirm_identity(&self) -> ProviderResult<()>;

    /// Creates a wallet for the current identity.
    ///
    /// # Errors
    ///
    /// Returns an error if wallet creation fails.
    async fn create_wallet(&self) -> ProviderResult<CreatedWallet>;

    /// Lists the wallets known for the current identity, keyed by wallet id.
    ///
    /// # Errors
    ///
    /// Returns an error if wallets cannot be listed.
    async fn wallets(&self) -> ProviderResult<BTreeMap<String, ProviderWallet>>;

    /// Signs a 32-byte digest, passed base64 encoded.
    ///
    /// Returns the hex signature: `r || s` optionally followed by a recovery byte.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    async fn sign_message(&self, wallet_id: &str, message_base64: &str) -> ProviderResult<String>;

    /// Signs a transaction on behalf of a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    async fn sign_transaction(
        &self,
        wallet_id: &str,
        transaction: &TransactionRequest,
    ) -> ProviderResult<RawSignature>;
}
