#![allow(dead_code)]

//! Common test utilities shared across integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy_primitives::{hex, Address, B256};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use keyring_core::{
    memory::RecordingEventSink,
    provider::{CreatedWallet, ProviderResult, SessionCredentials},
    signing::TransactionRequest,
    AccountKeyring, KeyringConfig, ProviderError, ProviderWallet, RawSignature, SigningProvider,
    StateStore,
};

/// Companion dapp origin granted every method.
pub const DAPP_ORIGIN: &str = "https://keyring.example";
/// Host runtime origin.
pub const HOST_ORIGIN: &str = "metamask";

const WALLET_KEY: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

/// Installs a `warn`-level subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Development config pointing at [`DAPP_ORIGIN`].
pub fn config() -> KeyringConfig {
    KeyringConfig {
        dapp_origin_development: Some(format!("{DAPP_ORIGIN}/")),
        ..KeyringConfig::default()
    }
}

/// Provider holding a single local key, logged in once a session cookie is set.
pub struct LocalProvider {
    signer: PrivateKeySigner,
    logged_in: AtomicBool,
}

impl LocalProvider {
    /// Logged-out provider over the fixed test key.
    pub fn new() -> Self {
        Self {
            signer: WALLET_KEY.parse().unwrap(),
            logged_in: AtomicBool::new(false),
        }
    }

    /// Address of the test key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The underlying local signer.
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SigningProvider for LocalProvider {
    async fn init(&self) -> ProviderResult<()> {
        Ok(())
    }

    async fn is_fully_logged_in(&self) -> ProviderResult<bool> {
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn set_session(&self, credentials: &SessionCredentials) -> ProviderResult<()> {
        if credentials.has_session() {
            self.logged_in.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn confirm_identity(&self) -> ProviderResult<()> {
        Ok(())
    }

    async fn create_wallet(&self) -> ProviderResult<CreatedWallet> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err(ProviderError::new("no session"));
        }
        Ok(CreatedWallet {
            recovery_secret: None,
        })
    }

    async fn wallets(&self) -> ProviderResult<BTreeMap<String, ProviderWallet>> {
        Ok(BTreeMap::from([(
            "local".to_string(),
            ProviderWallet {
                id: "local".to_string(),
                address: self.address(),
            },
        )]))
    }

    async fn sign_message(&self, _wallet_id: &str, message_base64: &str) -> ProviderResult<String> {
        let digest = BASE64
            .decode(message_base64)
            .map_err(|e| ProviderError::new(e.to_string()))?;
        let signature = self
            .signer
            .sign_hash_sync(&B256::from_slice(&digest))
            .map_err(|e| ProviderError::new(e.to_string()))?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }

    async fn sign_transaction(
        &self,
        _wallet_id: &str,
        _transaction: &TransactionRequest,
    ) -> ProviderResult<RawSignature> {
        Err(ProviderError::new("transactions are not supported"))
    }
}

/// Keyring over `provider` and `store`, recording its events.
pub async fn keyring(
    provider: Arc<LocalProvider>,
    store: Arc<dyn StateStore>,
) -> (AccountKeyring, Arc<RecordingEventSink>) {
    init_tracing();
    let events = Arc::new(RecordingEventSink::new());
    let keyring = AccountKeyring::init(config(), provider, store, events.clone())
        .await
        .unwrap();
    (keyring, events)
}
