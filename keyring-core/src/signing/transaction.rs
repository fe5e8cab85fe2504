use std::str::FromStr;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::{KeyringError, KeyringResult},
    provider::{ProviderError, RawSignature},
};

/// Transaction type id of fee-market (EIP-1559) transactions.
const FEE_MARKET_TX_TYPE: u8 = 2;

/// Transaction fields as received from the caller.
///
/// Numeric fields accept JSON numbers, decimal strings or hex quantities and
/// are re-emitted as hex quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Sender, which must be a keyring account.
    pub from: Address,
    /// Recipient; absent for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Value transferred, in wei.
    #[serde(default, deserialize_with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Gas limit.
    #[serde(
        default,
        alias = "gas",
        deserialize_with = "quantity_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_limit: Option<U256>,
    /// Legacy gas price.
    #[serde(default, deserialize_with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// Fee-market cap on the total fee per gas.
    #[serde(default, deserialize_with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// Fee-market priority fee per gas.
    #[serde(default, deserialize_with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Sender nonce.
    #[serde(default, deserialize_with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    /// Call data.
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Target chain.
    #[serde(deserialize_with = "quantity")]
    pub chain_id: U256,
    /// Explicit transaction type.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "quantity_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub tx_type: Option<U256>,
    /// EIP-2930 access list, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Value>,
}

impl TransactionRequest {
    /// Whether the transaction uses priority-fee / max-fee gas pricing.
    #[must_use]
    pub fn is_fee_market(&self) -> bool {
        self.max_fee_per_gas.is_some()
            || self.max_priority_fee_per_gas.is_some()
            || self.tx_type == Some(U256::from(FEE_MARKET_TX_TYPE))
    }
}

/// Attaches the provider signature to `tx`.
///
/// Legacy transactions keep the provider's `v` as-is. Fee-market
/// transactions carry a bare y-parity, so `27/28` becomes `0/1`.
///
/// # Errors
///
/// Returns an error if a fee-market `v` is neither `0/1` nor `27/28`.
pub fn signed_transaction(
    tx: &TransactionRequest,
    signature: &RawSignature,
) -> KeyringResult<Value> {
    let v = if tx.is_fee_market() {
        match signature.v {
            27 | 28 => signature.v - 27,
            0 | 1 => signature.v,
            other => {
                return Err(ProviderError::new(format!(
                    "unexpected recovery value {other} for fee-market transaction"
                ))
                .into())
            }
        }
    } else {
        signature.v
    };

    let mut value = serde_json::to_value(tx)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| KeyringError::invalid_params("transaction is not an object"))?;
    object.insert("v".to_string(), serde_json::to_value(U256::from(v))?);
    object.insert("r".to_string(), serde_json::to_value(signature.r)?);
    object.insert("s".to_string(), serde_json::to_value(signature.s)?);
    Ok(value)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(u64),
    Text(String),
}

fn parse_quantity(raw: RawQuantity) -> Result<U256, String> {
    match raw {
        RawQuantity::Number(n) => Ok(U256::from(n)),
        RawQuantity::Text(text) => {
            U256::from_str(text.trim()).map_err(|e| format!("invalid quantity '{text}': {e}"))
        }
    }
}

fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    parse_quantity(RawQuantity::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

fn quantity_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
    Option::<RawQuantity>::deserialize(deserializer)?
        .map(parse_quantity)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy() -> TransactionRequest {
        serde_json::from_value(json!({
            "from": "0x00000000000000000000000000000000000000aa",
            "to": "0x00000000000000000000000000000000000000bb",
            "value": "0x10",
            "gasLimit": "21000",
            "gasPrice": 1_000_000_000u64,
            "nonce": "0x0",
            "chainId": "11155111"
        }))
        .unwrap()
    }

    fn fee_market() -> TransactionRequest {
        serde_json::from_value(json!({
            "from": "0x00000000000000000000000000000000000000aa",
            "to": "0x00000000000000000000000000000000000000bb",
            "gas": "0x5208",
            "maxFeePerGas": "0xb2d05e00",
            "maxPriorityFeePerGas": "0x3b9aca00",
            "nonce": "0x1",
            "chainId": "0xaa36a7"
        }))
        .unwrap()
    }

    fn signature(v: u64) -> RawSignature {
        RawSignature {
            r: U256::from(1),
            s: U256::from(2),
            v,
        }
    }

    #[test]
    fn test_chain_id_decimal_and_hex_agree() {
        assert_eq!(legacy().chain_id, fee_market().chain_id);
        assert_eq!(legacy().gas_limit, Some(U256::from(21_000)));
        assert_eq!(fee_market().gas_limit, Some(U256::from(21_000)));
    }

    #[test]
    fn test_fee_market_detection() {
        assert!(!legacy().is_fee_market());
        assert!(fee_market().is_fee_market());

        let mut typed = legacy();
        typed.tx_type = Some(U256::from(2));
        assert!(typed.is_fee_market());
    }

    #[test]
    fn test_legacy_v_is_unmodified() {
        let signed = signed_transaction(&legacy(), &signature(22_310_258)).unwrap();
        assert_eq!(signed["v"], json!(format!("{:#x}", 22_310_258)));
        assert_eq!(signed["chainId"], "0xaa36a7");
    }

    #[test]
    fn test_fee_market_v_drops_offset() {
        let signed = signed_transaction(&fee_market(), &signature(28)).unwrap();
        assert_eq!(signed["v"], "0x1");
        assert_eq!(signed["r"], "0x1");
        assert_eq!(signed["s"], "0x2");

        let signed = signed_transaction(&fee_market(), &signature(0)).unwrap();
        assert_eq!(signed["v"], "0x0");
    }

    #[test]
    fn test_fee_market_rejects_eip155_v() {
        let err = signed_transaction(&fee_market(), &signature(37)).unwrap_err();
        assert!(matches!(err, KeyringError::Provider(_)));
    }
}
