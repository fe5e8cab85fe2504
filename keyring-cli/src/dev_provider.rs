//! Development signing provider backed by a plaintext key file.
//!
//! Stands in for the MPC backend when driving the keyring locally. The key
//! never leaves this process, but it is stored unencrypted: do not use it
//! for real funds.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use alloy::consensus::{SignableTransaction, TxEip1559, TxLegacy};
use alloy::eips::eip2930::AccessList;
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy_primitives::{hex, TxKind, B256, U256};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use keyring_core::{
    provider::{CreatedWallet, ProviderResult, SessionCredentials},
    signing::TransactionRequest,
    ProviderError, ProviderWallet, RawSignature, SigningProvider,
};
use serde_json::Value;

const WALLET_ID: &str = "local";

/// Signs with a single secp256k1 key kept in `key_path`.
#[derive(Debug)]
pub struct LocalKeyProvider {
    key_path: PathBuf,
    signer: RwLock<Option<PrivateKeySigner>>,
}

impl LocalKeyProvider {
    /// Provider reading and writing its key at `key_path`.
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            signer: RwLock::new(None),
        }
    }

    fn signer(&self) -> ProviderResult<PrivateKeySigner> {
        self.signer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ProviderError::new("no wallet has been created"))
    }

    fn install(&self, signer: PrivateKeySigner) {
        *self.signer.write().unwrap_or_else(PoisonError::into_inner) = Some(signer);
    }
}

fn to_u64(value: Option<U256>, field: &str) -> ProviderResult<u64> {
    u64::try_from(value.unwrap_or_default())
        .map_err(|e| ProviderError::new(format!("{field}: {e}")))
}

fn to_u128(value: Option<U256>, field: &str) -> ProviderResult<u128> {
    u128::try_from(value.unwrap_or_default())
        .map_err(|e| ProviderError::new(format!("{field}: {e}")))
}

/// Legacy replay-protected `v`: `chain_id * 2 + 35 + parity`.
fn eip155_v(chain_id: u64, parity: u64) -> ProviderResult<u64> {
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(35 + parity))
        .ok_or_else(|| ProviderError::new(format!("chainId {chain_id} too large for EIP-155")))
}

fn signing_hash(tx: &TransactionRequest) -> ProviderResult<B256> {
    let chain_id = to_u64(Some(tx.chain_id), "chainId")?;
    let to = tx.to.map_or(TxKind::Create, TxKind::Call);
    let input = tx.data.clone().unwrap_or_default();

    if !tx.is_fee_market() {
        return Ok(TxLegacy {
            chain_id: Some(chain_id),
            nonce: to_u64(tx.nonce, "nonce")?,
            gas_price: to_u128(tx.gas_price, "gasPrice")?,
            gas_limit: to_u64(tx.gas_limit, "gasLimit")?,
            to,
            value: tx.value.unwrap_or_default(),
            input,
        }
        .signature_hash());
    }

    if tx
        .access_list
        .as_ref()
        .and_then(Value::as_array)
        .is_some_and(|entries| !entries.is_empty())
    {
        return Err(ProviderError::new("access lists are not supported"));
    }
    Ok(TxEip1559 {
        chain_id,
        nonce: to_u64(tx.nonce, "nonce")?,
        gas_limit: to_u64(tx.gas_limit, "gasLimit")?,
        max_fee_per_gas: to_u128(tx.max_fee_per_gas, "maxFeePerGas")?,
        max_priority_fee_per_gas: to_u128(tx.max_priority_fee_per_gas, "maxPriorityFeePerGas")?,
        to,
        value: tx.value.unwrap_or_default(),
        access_list: AccessList::default(),
        input,
    }
    .signature_hash())
}

#[async_trait]
impl SigningProvider for LocalKeyProvider {
    async fn init(&self) -> ProviderResult<()> {
        let raw = match tokio::fs::read_to_string(&self.key_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(ProviderError::new(format!("reading key file: {e}"))),
        };
        let signer: PrivateKeySigner = raw
            .trim()
            .parse()
            .map_err(|e| ProviderError::new(format!("invalid key file: {e}")))?;
        tracing::debug!(address = %signer.address(), "development key loaded");
        self.install(signer);
        Ok(())
    }

    async fn is_fully_logged_in(&self) -> ProviderResult<bool> {
        Ok(self.signer().is_ok())
    }

    async fn set_session(&self, credentials: &SessionCredentials) -> ProviderResult<()> {
        tracing::debug!(
            email = credentials.email.as_deref(),
            session = credentials.has_session(),
            "session material ignored by development provider"
        );
        Ok(())
    }

    async fn confirm_identity(&self) -> ProviderResult<()> {
        self.signer().map(drop)
    }

    async fn create_wallet(&self) -> ProviderResult<CreatedWallet> {
        if self.signer().is_ok() {
            return Ok(CreatedWallet {
                recovery_secret: None,
            });
        }

        let signer = PrivateKeySigner::random();
        if let Some(parent) = self.key_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ProviderError::new(format!("creating key directory: {e}")))?;
        }
        tokio::fs::write(&self.key_path, hex::encode_prefixed(signer.to_bytes()))
            .await
            .map_err(|e| ProviderError::new(format!("writing key file: {e}")))?;
        tracing::info!(
            address = %signer.address(),
            path = %self.key_path.display(),
            "development key created"
        );
        self.install(signer);
        Ok(CreatedWallet {
            recovery_secret: None,
        })
    }

    async fn wallets(&self) -> ProviderResult<BTreeMap<String, ProviderWallet>> {
        Ok(self
            .signer()
            .ok()
            .map(|signer| {
                (
                    WALLET_ID.to_string(),
                    ProviderWallet {
                        id: WALLET_ID.to_string(),
                        address: signer.address(),
                    },
                )
            })
            .into_iter()
            .collect())
    }

    async fn sign_message(&self, wallet_id: &str, message_base64: &str) -> ProviderResult<String> {
        if wallet_id != WALLET_ID {
            return Err(ProviderError::new(format!("unknown wallet {wallet_id}")));
        }
        let digest = BASE64
            .decode(message_base64)
            .map_err(|e| ProviderError::new(format!("invalid digest encoding: {e}")))?;
        let digest = B256::try_from(digest.as_slice())
            .map_err(|_| ProviderError::new("digest must be 32 bytes"))?;
        let signature = self
            .signer()?
            .sign_hash_sync(&digest)
            .map_err(|e| ProviderError::new(e.to_string()))?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }

    async fn sign_transaction(
        &self,
        wallet_id: &str,
        transaction: &TransactionRequest,
    ) -> ProviderResult<RawSignature> {
        if wallet_id != WALLET_ID {
            return Err(ProviderError::new(format!("unknown wallet {wallet_id}")));
        }
        let hash = signing_hash(transaction)?;
        let signature = self
            .signer()?
            .sign_hash_sync(&hash)
            .map_err(|e| ProviderError::new(e.to_string()))?;
        let parity = u64::from(signature.v());
        let v = if transaction.is_fee_market() {
            parity
        } else {
            eip155_v(to_u64(Some(transaction.chain_id), "chainId")?, parity)?
        };
        Ok(RawSignature {
            r: signature.r(),
            s: signature.s(),
            v,
        })
    }
}
