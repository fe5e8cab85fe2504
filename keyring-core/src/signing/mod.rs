//! Signing dispatch over the closed [`EthMethod`] vocabulary.
//!
//! The keyring computes every message digest itself and only asks the
//! provider for raw signatures over them. Whatever the provider returns is
//! normalized to a 65-byte `r || s || v` signature (`v` in `27/28`) and, for
//! `personal_sign` and `eth_sign`, checked against the claimed signer.

use std::str::FromStr;

use alloy_primitives::{eip191_hash_message, hex, Address, Bytes, B256};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    error::{KeyringError, KeyringResult},
    provider::{ProviderError, ProviderWallet, SigningProvider},
    state::KeyringState,
};

mod signature;
mod transaction;
mod typed_data;

pub use signature::{normalize_signature, verify_signer};
pub use transaction::{signed_transaction, TransactionRequest};
pub use typed_data::{typed_data_v1_hash, typed_data_v3_hash, typed_data_v4_hash};

/// Operations an account can be asked to perform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
pub enum EthMethod {
    /// EIP-191 personal message signature.
    #[serde(rename = "personal_sign")]
    #[strum(serialize = "personal_sign")]
    PersonalSign,
    /// Signature over a raw 32-byte hash.
    #[serde(rename = "eth_sign")]
    #[strum(serialize = "eth_sign")]
    Sign,
    /// Transaction signature.
    #[serde(rename = "eth_signTransaction")]
    #[strum(serialize = "eth_signTransaction")]
    SignTransaction,
    /// Legacy typed data.
    #[serde(rename = "eth_signTypedData_v1")]
    #[strum(serialize = "eth_signTypedData_v1")]
    SignTypedDataV1,
    /// EIP-712 typed data without array support.
    #[serde(rename = "eth_signTypedData_v3")]
    #[strum(serialize = "eth_signTypedData_v3")]
    SignTypedDataV3,
    /// EIP-712 typed data.
    #[serde(rename = "eth_signTypedData_v4")]
    #[strum(serialize = "eth_signTypedData_v4")]
    SignTypedDataV4,
}

/// Executes signing requests against a provider on behalf of keyring accounts.
pub(crate) struct RequestSigner<'a> {
    provider: &'a dyn SigningProvider,
    state: &'a KeyringState,
}

impl<'a> RequestSigner<'a> {
    pub(crate) fn new(provider: &'a dyn SigningProvider, state: &'a KeyringState) -> Self {
        Self { provider, state }
    }

    /// Runs `method` with positional `params`, returning the JSON result.
    pub(crate) async fn handle(&self, method: &str, params: &Value) -> KeyringResult<Value> {
        let method = EthMethod::from_str(method)
            .map_err(|_| KeyringError::UnsupportedMethod(method.to_string()))?;
        tracing::debug!(%method, "dispatching signing request");

        match method {
            EthMethod::PersonalSign => {
                let message = message_param(params, 0)?;
                let from: Address = positional(params, 1, "from")?;
                let digest = eip191_hash_message(&message);
                self.sign_verified(from, digest).await
            }
            EthMethod::Sign => {
                let from: Address = positional(params, 0, "from")?;
                let digest: B256 = positional(params, 1, "data")?;
                self.sign_verified(from, digest).await
            }
            EthMethod::SignTransaction => {
                let tx: TransactionRequest = positional(params, 0, "transaction")?;
                let wallet = self.wallet_for(tx.from).await?;
                let raw = self.provider.sign_transaction(&wallet.id, &tx).await?;
                signed_transaction(&tx, &raw)
            }
            EthMethod::SignTypedDataV1 => {
                let (from, data) = typed_data_params(params)?;
                self.sign_unverified(from, typed_data_v1_hash(&data)?).await
            }
            EthMethod::SignTypedDataV3 => {
                let (from, data) = typed_data_params(params)?;
                self.sign_unverified(from, typed_data_v3_hash(&data)?).await
            }
            EthMethod::SignTypedDataV4 => {
                let (from, data) = typed_data_params(params)?;
                self.sign_unverified(from, typed_data_v4_hash(&data)?).await
            }
        }
    }

    async fn sign_verified(&self, from: Address, digest: B256) -> KeyringResult<Value> {
        let wallet = self.wallet_for(from).await?;
        let signature = self.sign_digest(&wallet, digest).await?;
        verify_signer(&signature, &digest, from)?;
        Ok(Value::String(hex::encode_prefixed(signature.as_bytes())))
    }

    async fn sign_unverified(&self, from: Address, digest: B256) -> KeyringResult<Value> {
        let wallet = self.wallet_for(from).await?;
        let signature = self.sign_digest(&wallet, digest).await?;
        Ok(Value::String(hex::encode_prefixed(signature.as_bytes())))
    }

    async fn sign_digest(
        &self,
        wallet: &ProviderWallet,
        digest: B256,
    ) -> KeyringResult<alloy_primitives::Signature> {
        let raw = self
            .provider
            .sign_message(&wallet.id, &BASE64.encode(digest))
            .await?;
        normalize_signature(&raw, &digest, wallet.address)
    }

    /// Resolves the provider wallet backing the keyring account at `from`.
    async fn wallet_for(&self, from: Address) -> KeyringResult<ProviderWallet> {
        if self.state.account_by_address(&from).is_none() {
            return Err(KeyringError::AccountNotFound(from.to_string()));
        }
        self.provider
            .wallets()
            .await?
            .into_values()
            .find(|wallet| wallet.address == from)
            .ok_or_else(|| {
                ProviderError::new(format!("no provider wallet for address {from}")).into()
            })
    }
}

/// Deserializes the positional parameter at `index`.
fn positional<T: DeserializeOwned>(params: &Value, index: usize, name: &str) -> KeyringResult<T> {
    let value = params
        .get(index)
        .ok_or_else(|| KeyringError::invalid_params(format!("missing parameter `{name}`")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| KeyringError::invalid_params(format!("invalid `{name}`: {e}")))
}

/// Message to sign: hex when `0x`-prefixed and valid, UTF-8 text otherwise.
fn message_param(params: &Value, index: usize) -> KeyringResult<Bytes> {
    let message: String = positional(params, index, "message")?;
    if message.starts_with("0x") {
        if let Ok(bytes) = hex::decode(&message) {
            return Ok(bytes.into());
        }
    }
    Ok(Bytes::from(message.into_bytes()))
}

/// `[from, data]`, where `data` may be embedded as a JSON string.
fn typed_data_params(params: &Value) -> KeyringResult<(Address, Value)> {
    let from: Address = positional(params, 0, "from")?;
    let data: Value = positional(params, 1, "data")?;
    let data = match data {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| KeyringError::invalid_params(format!("invalid `data`: {e}")))?,
        other => other,
    };
    Ok((from, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_method_names_round_trip() {
        for method in EthMethod::iter() {
            let parsed = EthMethod::from_str(method.as_ref()).unwrap();
            assert_eq!(parsed, method);
            assert_eq!(serde_json::to_value(method).unwrap(), json!(method.to_string()));
        }
        assert!(EthMethod::from_str("eth_sendTransaction").is_err());
    }

    #[test]
    fn test_message_param_hex_or_text() {
        let hex_message = message_param(&json!(["0x1234"]), 0).unwrap();
        assert_eq!(hex_message.as_ref(), [0x12, 0x34]);

        let text = message_param(&json!(["hello"]), 0).unwrap();
        assert_eq!(text.as_ref(), b"hello");

        let odd = message_param(&json!(["0xnothex"]), 0).unwrap();
        assert_eq!(odd.as_ref(), b"0xnothex");
    }

    #[test]
    fn test_missing_param_is_invalid() {
        let err = positional::<Address>(&json!([]), 0, "from").unwrap_err();
        assert!(matches!(err, KeyringError::InvalidParams(_)));
    }

    #[test]
    fn test_typed_data_params_accepts_json_string() {
        let (_, data) = typed_data_params(&json!([
            "0x00000000000000000000000000000000000000aa",
            "{\"primaryType\":\"Mail\"}"
        ]))
        .unwrap();
        assert_eq!(data["primaryType"], "Mail");
    }
}
