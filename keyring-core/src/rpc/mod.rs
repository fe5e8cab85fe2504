//! JSON-RPC surface of the keyring.
//!
//! Each call is checked against an [`OriginPermissions`] allow-list, its
//! params are decoded into the matching keyring operation and the outcome is
//! serialized back to JSON.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    account::{Account, AccountOptions},
    error::{KeyringError, KeyringResult},
    keyring::AccountKeyring,
    request::KeyringRequest,
};

mod permissions;

pub use permissions::{OriginPermissions, HOST_METHODS};

/// Every method the keyring answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
pub enum KeyringRpcMethod {
    /// List all accounts.
    #[strum(serialize = "keyring_listAccounts")]
    ListAccounts,
    /// Get one account.
    #[strum(serialize = "keyring_getAccount")]
    GetAccount,
    /// Create an account.
    #[strum(serialize = "keyring_createAccount")]
    CreateAccount,
    /// Filter chains supported by an account.
    #[strum(serialize = "keyring_filterAccountChains")]
    FilterAccountChains,
    /// Merge account options.
    #[strum(serialize = "keyring_updateAccount")]
    UpdateAccount,
    /// Delete an account.
    #[strum(serialize = "keyring_deleteAccount")]
    DeleteAccount,
    /// Export account key material (never supported).
    #[strum(serialize = "keyring_exportAccount")]
    ExportAccount,
    /// List queued requests.
    #[strum(serialize = "keyring_listRequests")]
    ListRequests,
    /// Get one queued request.
    #[strum(serialize = "keyring_getRequest")]
    GetRequest,
    /// Submit a signing request.
    #[strum(serialize = "keyring_submitRequest")]
    SubmitRequest,
    /// Approve a queued request.
    #[strum(serialize = "keyring_approveRequest")]
    ApproveRequest,
    /// Reject a queued request.
    #[strum(serialize = "keyring_rejectRequest")]
    RejectRequest,
    /// Flip synchronous approvals.
    #[strum(serialize = "keyring_internal_toggleSyncApprovals")]
    ToggleSyncApprovals,
    /// Read the approval mode.
    #[strum(serialize = "keyring_internal_isSynchronousMode")]
    IsSynchronousMode,
}

/// A JSON-RPC call addressed to the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcCall {
    /// Method name.
    pub method: String,
    /// Named parameters.
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcCall {
    /// Builds a call from its parts.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

#[derive(Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Deserialize)]
struct CreateAccountParams {
    #[serde(default)]
    options: AccountOptions,
}

#[derive(Deserialize)]
struct FilterChainsParams {
    id: String,
    chains: Vec<String>,
}

#[derive(Deserialize)]
struct UpdateAccountParams {
    account: Account,
}

/// Handles `call` from `origin`.
///
/// # Errors
///
/// Returns [`KeyringError::Unauthorized`] if `origin` may not call the
/// method, [`KeyringError::InvalidParams`] for malformed params, or whatever
/// the keyring operation fails with.
pub async fn handle_request(
    keyring: &mut AccountKeyring,
    permissions: &OriginPermissions,
    origin: &str,
    call: &JsonRpcCall,
) -> KeyringResult<Value> {
    let method = match permissions.check(origin, &call.method) {
        Ok(method) => method,
        Err(err) => {
            tracing::warn!(%origin, method = %call.method, "rpc call denied");
            return Err(err);
        }
    };
    tracing::debug!(%origin, %method, "rpc call");

    match method {
        KeyringRpcMethod::ListAccounts => Ok(serde_json::to_value(keyring.list_accounts())?),
        KeyringRpcMethod::GetAccount => {
            let IdParams { id } = params(call)?;
            Ok(serde_json::to_value(keyring.get_account(&id)?)?)
        }
        KeyringRpcMethod::CreateAccount => {
            let CreateAccountParams { options } = params(call)?;
            Ok(keyring.create_account(options).await?.to_json()?)
        }
        KeyringRpcMethod::FilterAccountChains => {
            let FilterChainsParams { id, chains } = params(call)?;
            Ok(serde_json::to_value(keyring.filter_account_chains(&id, &chains))?)
        }
        KeyringRpcMethod::UpdateAccount => {
            let UpdateAccountParams { account } = params(call)?;
            keyring.update_account(account).await?;
            Ok(Value::Null)
        }
        KeyringRpcMethod::DeleteAccount => {
            let IdParams { id } = params(call)?;
            keyring.delete_account(&id).await?;
            Ok(Value::Null)
        }
        KeyringRpcMethod::ExportAccount => {
            Err(KeyringError::UnsupportedMethod(call.method.clone()))
        }
        KeyringRpcMethod::ListRequests => Ok(serde_json::to_value(keyring.list_requests())?),
        KeyringRpcMethod::GetRequest => {
            let IdParams { id } = params(call)?;
            Ok(serde_json::to_value(keyring.get_request(&id)?)?)
        }
        KeyringRpcMethod::SubmitRequest => {
            let request: KeyringRequest = params(call)?;
            Ok(serde_json::to_value(keyring.submit_request(request).await?)?)
        }
        KeyringRpcMethod::ApproveRequest => {
            let IdParams { id } = params(call)?;
            keyring.approve_request(&id).await?;
            Ok(Value::Null)
        }
        KeyringRpcMethod::RejectRequest => {
            let IdParams { id } = params(call)?;
            keyring.reject_request(&id, false).await?;
            Ok(Value::Null)
        }
        KeyringRpcMethod::ToggleSyncApprovals => {
            keyring.toggle_sync_approvals().await?;
            Ok(Value::Null)
        }
        KeyringRpcMethod::IsSynchronousMode => Ok(Value::Bool(keyring.is_synchronous_mode())),
    }
}

fn params<T: DeserializeOwned>(call: &JsonRpcCall) -> KeyringResult<T> {
    serde_json::from_value(call.params.clone())
        .map_err(|e| KeyringError::invalid_params(format!("{}: {e}", call.method)))
}
