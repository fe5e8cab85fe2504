//! The account keyring: accounts, pending requests and approval modes.
//!
//! # Approval flow
//!
//! ```text
//! submit_request(req)
//!    ├─ provider not logged in → drop any queued `req.id`, Pending { redirect: url }
//!    ├─ sync mode              → sign now, Completed { result }
//!    └─ async mode             → queue, Pending { redirect: url + message }
//!
//! approve_request(id)  → sign, emit RequestApproved, dequeue (failure keeps it queued)
//! reject_request(id)   → emit RequestRejected, dequeue
//! ```
//!
//! # State commits
//!
//! Every mutation builds the next [`KeyringState`] as a separate value,
//! awaits [`StateStore::save`] on it and only then swaps it in. Events are
//! emitted before the save, so a failing sink aborts the operation too. A
//! failing provider call, event or save leaves the keyring exactly as it was.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    account::{Account, AccountOptions, CreatedAccount},
    chains::is_evm_chain,
    config::{KeyringConfig, ASYNC_REDIRECT_MESSAGE},
    error::{KeyringError, KeyringResult},
    events::{EventSink, KeyringEvent},
    provider::{ProviderError, SigningProvider},
    request::{KeyringRequest, Redirect, RequestPayload, SubmitRequestResponse},
    signing::RequestSigner,
    state::KeyringState,
    store::StateStore,
};


/// Keyring exposing provider-backed accounts to a host runtime.
pub struct AccountKeyring {
    config: KeyringConfig,
    provider: Arc<dyn SigningProvider>,
    store: Arc<dyn StateStore>,
    events: Arc<dyn EventSink>,
    state: KeyringState,
}

impl std::fmt::Debug for AccountKeyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountKeyring")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AccountKeyring {
    /// Loads the persisted state and initializes the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state cannot be read or the provider
    /// fails to initialize.
    pub async fn init(
        config: KeyringConfig,
        provider: Arc<dyn SigningProvider>,
        store: Arc<dyn StateStore>,
        events: Arc<dyn EventSink>,
    ) -> KeyringResult<Self> {
        let state = store.load().await?.unwrap_or_default();
        provider.init().await?;
        info!(
            accounts = state.accounts.len(),
            pending = state.pending_requests.len(),
            sync = state.use_sync_approvals,
            "keyring initialized"
        );
        Ok(Self {
            config,
            provider,
            store,
            events,
            state,
        })
    }

    /// The committed state.
    #[must_use]
    pub const fn state(&self) -> &KeyringState {
        &self.state
    }

    /// The keyring configuration.
    #[must_use]
    pub const fn config(&self) -> &KeyringConfig {
        &self.config
    }

    // Accounts

    /// All accounts.
    #[must_use]
    pub fn list_accounts(&self) -> Vec<Account> {
        self.state.accounts.values().cloned().collect()
    }

    /// The account stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::AccountNotFound`] if there is none.
    pub fn get_account(&self, id: &str) -> KeyringResult<Account> {
        self.state
            .accounts
            .get(id)
            .cloned()
            .ok_or_else(|| KeyringError::AccountNotFound(id.to_string()))
    }

    /// Establishes the provider identity described by `options` and creates
    /// an account for the wallet it yields.
    ///
    /// Provider-issued secrets are returned alongside the account and never
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::Provider`] if the provider cannot establish the
    /// identity or yields no wallet, [`KeyringError::DuplicateAddress`] if the
    /// wallet address already backs an account, or the event/storage error
    /// that aborted the operation.
    pub async fn create_account(
        &mut self,
        options: AccountOptions,
    ) -> KeyringResult<CreatedAccount> {
        let options = options.strip_transient();
        self.provider
            .set_session(&options.session_credentials())
            .await?;
        let created = self.provider.create_wallet().await?;
        let wallet = self
            .provider
            .wallets()
            .await?
            .into_values()
            .next()
            .ok_or_else(|| ProviderError::new("provider returned no wallet"))?;

        if !self.state.is_unique_address(&wallet.address) {
            warn!(address = %wallet.address, "refusing duplicate account address");
            return Err(KeyringError::DuplicateAddress(wallet.address));
        }

        let account = Account::new_eoa(Uuid::new_v4().to_string(), wallet.address, options);
        self.events
            .emit(&KeyringEvent::AccountCreated {
                account: account.clone(),
            })
            .await?;

        let mut next = self.state.clone();
        next.accounts.insert(account.id.clone(), account.clone());
        self.commit(next).await?;

        info!(id = %account.id, address = %account.address, "account created");
        Ok(CreatedAccount {
            account,
            recovery_secret: created.recovery_secret,
        })
    }

    /// Merges the options of `account` into the stored account.
    ///
    /// The stored address, methods and type always win. When the patch
    /// carries a session credential the provider session is restored and
    /// re-confirmed first; if that fails nothing is updated.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::AccountNotFound`] for an unknown id, or the
    /// provider/event/storage error that aborted the update.
    pub async fn update_account(&mut self, account: Account) -> KeyringResult<()> {
        let stored = self
            .state
            .accounts
            .get(&account.id)
            .ok_or_else(|| KeyringError::AccountNotFound(account.id.clone()))?;
        let reauthenticate = account.options.session_cookie.is_some();
        let updated = stored.patched(account);

        if reauthenticate {
            debug!(id = %updated.id, "re-confirming provider session");
            self.provider
                .set_session(&updated.options.session_credentials())
                .await?;
            self.provider.confirm_identity().await?;
        }

        self.events
            .emit(&KeyringEvent::AccountUpdated {
                account: updated.clone(),
            })
            .await?;

        let mut next = self.state.clone();
        next.accounts.insert(updated.id.clone(), updated);
        self.commit(next).await
    }

    /// Removes the account stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::AccountNotFound`] for an unknown id, or the
    /// event/storage error that aborted the deletion.
    pub async fn delete_account(&mut self, id: &str) -> KeyringResult<()> {
        if !self.state.accounts.contains_key(id) {
            return Err(KeyringError::AccountNotFound(id.to_string()));
        }
        self.events
            .emit(&KeyringEvent::AccountDeleted { id: id.to_string() })
            .await?;

        let mut next = self.state.clone();
        next.accounts.remove(id);
        self.commit(next).await?;
        info!(%id, "account deleted");
        Ok(())
    }

    /// The subset of `chains` usable by this keyring's accounts.
    ///
    /// Every account supports every EVM chain, so `_id` is not looked up.
    #[must_use]
    pub fn filter_account_chains(&self, _id: &str, chains: &[String]) -> Vec<String> {
        chains
            .iter()
            .filter(|chain| is_evm_chain(chain))
            .cloned()
            .collect()
    }

    // Requests

    /// All queued requests.
    #[must_use]
    pub fn list_requests(&self) -> Vec<KeyringRequest> {
        self.state.pending_requests.values().cloned().collect()
    }

    /// The queued request stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::RequestNotFound`] if there is none.
    pub fn get_request(&self, id: &str) -> KeyringResult<KeyringRequest> {
        self.state
            .pending_requests
            .get(id)
            .cloned()
            .ok_or_else(|| KeyringError::RequestNotFound(id.to_string()))
    }

    /// Submits a new signing request.
    ///
    /// # Errors
    ///
    /// In synchronous mode, any signing error. Otherwise the provider or
    /// storage error that prevented queueing.
    pub async fn submit_request(
        &mut self,
        request: KeyringRequest,
    ) -> KeyringResult<SubmitRequestResponse> {
        if !self.provider.is_fully_logged_in().await? {
            debug!(id = %request.id, "provider session incomplete, redirecting");
            self.reject_request(&request.id, true).await?;
            return Ok(SubmitRequestResponse::Pending {
                redirect: Some(Redirect {
                    url: self.config.redirect_url(),
                    message: None,
                }),
            });
        }

        if self.state.use_sync_approvals {
            let result = self.handle_signing_request(&request.request).await?;
            return Ok(SubmitRequestResponse::Completed { result });
        }

        let mut next = self.state.clone();
        next.pending_requests
            .insert(request.id.clone(), request.clone());
        self.commit(next).await?;
        info!(id = %request.id, method = %request.request.method, "request queued");

        Ok(SubmitRequestResponse::Pending {
            redirect: Some(Redirect {
                url: self.config.redirect_url(),
                message: Some(ASYNC_REDIRECT_MESSAGE.to_string()),
            }),
        })
    }

    /// Signs the queued request `id` and dequeues it.
    ///
    /// If signing fails the request stays queued.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::RequestNotFound`] (without touching the
    /// provider) for an unknown id, or the signing/storage/event error.
    pub async fn approve_request(&mut self, id: &str) -> KeyringResult<Value> {
        let request = self.get_request(id)?;
        let result = match self.handle_signing_request(&request.request).await {
            Ok(result) => result,
            Err(err) => {
                warn!(%id, error = %err, "signing failed, request stays queued");
                return Err(err);
            }
        };

        self.events
            .emit(&KeyringEvent::RequestApproved {
                id: id.to_string(),
                result: result.clone(),
            })
            .await?;

        let mut next = self.state.clone();
        next.pending_requests.remove(id);
        self.commit(next).await?;
        info!(%id, "request approved");
        Ok(result)
    }

    /// Drops the queued request `id` without signing.
    ///
    /// With `skip_not_found` an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::RequestNotFound`] for an unknown id unless
    /// `skip_not_found` is set, or the storage/event error.
    pub async fn reject_request(&mut self, id: &str, skip_not_found: bool) -> KeyringResult<()> {
        if !self.state.pending_requests.contains_key(id) {
            if skip_not_found {
                return Ok(());
            }
            return Err(KeyringError::RequestNotFound(id.to_string()));
        }

        self.events
            .emit(&KeyringEvent::RequestRejected { id: id.to_string() })
            .await?;

        let mut next = self.state.clone();
        next.pending_requests.remove(id);
        self.commit(next).await?;
        info!(%id, "request rejected");
        Ok(())
    }

    // Approval mode

    /// Flips synchronous approvals and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the flag could not be persisted.
    pub async fn toggle_sync_approvals(&mut self) -> KeyringResult<bool> {
        let mut next = self.state.clone();
        next.use_sync_approvals = !next.use_sync_approvals;
        self.commit(next).await?;
        info!(sync = self.state.use_sync_approvals, "approval mode toggled");
        Ok(self.state.use_sync_approvals)
    }

    /// Whether `submit_request` executes inline.
    #[must_use]
    pub const fn is_synchronous_mode(&self) -> bool {
        self.state.use_sync_approvals
    }

    async fn handle_signing_request(&self, payload: &RequestPayload) -> KeyringResult<Value> {
        RequestSigner::new(self.provider.as_ref(), &self.state)
            .handle(&payload.method, &payload.params)
            .await
    }

    /// Persists `next` and makes it the committed state.
    async fn commit(&mut self, next: KeyringState) -> KeyringResult<()> {
        self.store.save(&next).await?;
        self.state = next;
        Ok(())
    }
}
