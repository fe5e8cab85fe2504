use alloy_core::dyn_abi::{DynSolType, TypedData};
use alloy_primitives::{hex, keccak256, B256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{KeyringError, KeyringResult};

/// One `{type, name, value}` entry of legacy typed data.
#[derive(Debug, Deserialize)]
struct TypedDataV1Entry {
    #[serde(rename = "type")]
    ty: String,
    name: String,
    value: Value,
}

/// Hash of legacy (`v1`) typed data.
///
/// `keccak256(keccak256(packed schema) || keccak256(packed values))`, where
/// the schema is the concatenation of `"<type> <name>"` strings.
///
/// # Errors
///
/// Returns [`KeyringError::InvalidParams`] if an entry has an unknown type or
/// a value that does not fit it.
pub fn typed_data_v1_hash(data: &Value) -> KeyringResult<B256> {
    let entries: Vec<TypedDataV1Entry> = serde_json::from_value(data.clone())
        .map_err(|e| KeyringError::invalid_params(format!("invalid v1 typed data: {e}")))?;
    if entries.is_empty() {
        return Err(KeyringError::invalid_params("v1 typed data is empty"));
    }

    let mut schema = Vec::new();
    let mut values = Vec::new();
    for entry in &entries {
        schema.extend_from_slice(format!("{} {}", entry.ty, entry.name).as_bytes());
        values.extend_from_slice(&encode_packed_v1(entry)?);
    }

    let mut outer = [0u8; 64];
    outer[..32].copy_from_slice(keccak256(&schema).as_slice());
    outer[32..].copy_from_slice(keccak256(&values).as_slice());
    Ok(keccak256(outer))
}

fn encode_packed_v1(entry: &TypedDataV1Entry) -> KeyringResult<Vec<u8>> {
    let invalid = |reason: String| {
        KeyringError::invalid_params(format!("invalid v1 field '{}': {reason}", entry.name))
    };
    let text = match &entry.value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(invalid(format!("unsupported value {other}"))),
    };

    match entry.ty.as_str() {
        "string" => Ok(text.into_bytes()),
        // 0x-prefixed hex is decoded, anything else is taken as UTF-8
        "bytes" => Ok(text
            .strip_prefix("0x")
            .and_then(|digits| hex::decode(digits).ok())
            .unwrap_or_else(|| text.into_bytes())),
        ty => {
            let sol_type = DynSolType::parse(ty).map_err(|e| invalid(e.to_string()))?;
            let value = sol_type
                .coerce_str(&text)
                .map_err(|e| invalid(e.to_string()))?;
            Ok(value.abi_encode_packed())
        }
    }
}

/// EIP-712 signing hash, rejecting array members as `v3` did.
///
/// # Errors
///
/// Returns [`KeyringError::InvalidParams`] for array members or malformed data.
pub fn typed_data_v3_hash(data: &Value) -> KeyringResult<B256> {
    let has_arrays = data
        .get("types")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|types| types.values())
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|field| field.get("type").and_then(Value::as_str))
        .any(|ty| ty.ends_with(']'));
    if has_arrays {
        return Err(KeyringError::invalid_params(
            "arrays are unsupported by eth_signTypedData_v3, use v4",
        ));
    }
    typed_data_v4_hash(data)
}

/// EIP-712 signing hash.
///
/// # Errors
///
/// Returns [`KeyringError::InvalidParams`] if the data is not valid EIP-712.
pub fn typed_data_v4_hash(data: &Value) -> KeyringResult<B256> {
    let typed: TypedData = serde_json::from_value(data.clone())
        .map_err(|e| KeyringError::invalid_params(format!("invalid typed data: {e}")))?;
    typed
        .eip712_signing_hash()
        .map_err(|e| KeyringError::invalid_params(format!("invalid typed data: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use serde_json::json;

    fn mail(types_extra: Value) -> Value {
        let mut types = json!({
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "version", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" }
            ],
            "Person": [
                { "name": "name", "type": "string" },
                { "name": "wallet", "type": "address" }
            ],
            "Mail": [
                { "name": "from", "type": "Person" },
                { "name": "to", "type": "Person" },
                { "name": "contents", "type": "string" }
            ]
        });
        if let Some(extra) = types_extra.as_object() {
            for (k, v) in extra {
                types[k] = v.clone();
            }
        }
        json!({
            "types": types,
            "primaryType": "Mail",
            "domain": {
                "name": "Ether Mail",
                "version": "1",
                "chainId": 1,
                "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
            },
            "message": {
                "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
                "to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
                "contents": "Hello, Bob!"
            }
        })
    }

    #[test]
    fn test_v4_matches_eip712_reference_vector() {
        assert_eq!(
            typed_data_v4_hash(&mail(Value::Null)).unwrap(),
            b256!("0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")
        );
    }

    #[test]
    fn test_v3_matches_v4_without_arrays() {
        let data = mail(Value::Null);
        assert_eq!(
            typed_data_v3_hash(&data).unwrap(),
            typed_data_v4_hash(&data).unwrap()
        );
    }

    #[test]
    fn test_v3_rejects_arrays() {
        let data = mail(json!({
            "Group": [{ "name": "members", "type": "Person[]" }]
        }));
        let err = typed_data_v3_hash(&data).unwrap_err();
        assert!(matches!(err, KeyringError::InvalidParams(_)));
    }

    #[test]
    fn test_v1_hash_depends_on_schema_and_values() {
        let base = json!([
            { "type": "string", "name": "message", "value": "Hi, Alice!" },
            { "type": "uint32", "name": "value", "value": 42 }
        ]);
        let renamed = json!([
            { "type": "string", "name": "greeting", "value": "Hi, Alice!" },
            { "type": "uint32", "name": "value", "value": 42 }
        ]);
        let changed = json!([
            { "type": "string", "name": "message", "value": "Hi, Alice!" },
            { "type": "uint32", "name": "value", "value": "43" }
        ]);

        let hash = typed_data_v1_hash(&base).unwrap();
        assert_ne!(hash, typed_data_v1_hash(&renamed).unwrap());
        assert_ne!(hash, typed_data_v1_hash(&changed).unwrap());
    }

    #[test]
    fn test_v1_matches_reference_vector() {
        let data = json!([{ "type": "string", "name": "message", "value": "Hi, Alice!" }]);
        assert_eq!(
            typed_data_v1_hash(&data).unwrap(),
            b256!("0x14b9f24872e28cc49e72dc104d7380d8e0ba84a3fe2e712704bcac66a5702bd5")
        );
    }

    #[test]
    fn test_v1_bytes_accept_hex_or_text() {
        let bytes = |value: &str| json!([{ "type": "bytes", "name": "payload", "value": value }]);
        let utf8 = json!([{ "type": "string", "name": "payload", "value": "hello" }]);

        let text = typed_data_v1_hash(&bytes("hello")).unwrap();
        let hex = typed_data_v1_hash(&bytes("0x68656c6c6f")).unwrap();
        assert_eq!(text, hex);
        // same packed value, different schema string
        assert_ne!(text, typed_data_v1_hash(&utf8).unwrap());
    }

    #[test]
    fn test_v1_rejects_value_out_of_type() {
        let data = json!([{ "type": "address", "name": "to", "value": "not an address" }]);
        assert!(typed_data_v1_hash(&data).is_err());
        assert!(typed_data_v1_hash(&json!([])).is_err());
    }
}
