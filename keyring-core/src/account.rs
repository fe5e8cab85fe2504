//! Keyring account records.

use alloy_primitives::Address;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::{provider::SessionCredentials, signing::EthMethod};

/// Option keys that may arrive from callers but must never be stored or emitted.
pub const TRANSIENT_OPTION_KEYS: [&str; 2] = ["privateKey", "recoverySecret"];

/// Category of a keyring account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountType {
    /// Externally-owned account on an EVM chain.
    #[default]
    #[serde(rename = "eip155:eoa")]
    Eoa,
}

/// Provider identity and session metadata attached to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOptions {
    /// Email the provider identity is registered with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Provider user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Session credential relayed by the companion dapp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    /// Any other provider-specific metadata.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountOptions {
    /// Drops every key listed in [`TRANSIENT_OPTION_KEYS`].
    #[must_use]
    pub fn strip_transient(mut self) -> Self {
        for key in TRANSIENT_OPTION_KEYS {
            self.extra.remove(key);
        }
        self
    }

    /// Merges `patch` into `self`. Keys absent from the patch are preserved.
    pub fn merge(&mut self, patch: Self) {
        let patch = patch.strip_transient();
        if patch.email.is_some() {
            self.email = patch.email;
        }
        if patch.user_id.is_some() {
            self.user_id = patch.user_id;
        }
        if patch.session_cookie.is_some() {
            self.session_cookie = patch.session_cookie;
        }
        self.extra.extend(patch.extra);
    }

    /// Identity and session material to hand to the provider.
    #[must_use]
    pub fn session_credentials(&self) -> SessionCredentials {
        SessionCredentials {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            session_cookie: self.session_cookie.clone().map(SecretString::from),
        }
    }
}

/// A signing identity managed by the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Keyring-assigned identifier.
    pub id: String,
    /// Address controlled by the provider wallet backing this account.
    pub address: Address,
    /// Provider metadata.
    #[serde(default)]
    pub options: AccountOptions,
    /// Operations the account supports.
    pub methods: Vec<EthMethod>,
    /// Account category.
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

impl Account {
    /// Creates an EOA account supporting every [`EthMethod`].
    #[must_use]
    pub fn new_eoa(id: String, address: Address, options: AccountOptions) -> Self {
        Self {
            id,
            address,
            options: options.strip_transient(),
            methods: EthMethod::iter().collect(),
            account_type: AccountType::Eoa,
        }
    }

    /// Produces the next version of this account from a caller-supplied one.
    ///
    /// Only options are taken from `update`; the id, address, methods and type
    /// always keep their stored values.
    #[must_use]
    pub fn patched(&self, update: Self) -> Self {
        let mut next = self.clone();
        next.options.merge(update.options);
        next
    }
}

/// Account returned from creation, carrying return-only secrets.
///
/// The secrets are never part of the stored [`Account`].
#[derive(Debug)]
pub struct CreatedAccount {
    /// The stored account.
    pub account: Account,
    /// One-time recovery secret issued by the provider.
    pub recovery_secret: Option<SecretString>,
}

impl CreatedAccount {
    /// JSON view of the account with the recovery secret folded into its options.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be serialized.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(&self.account)?;
        if let (Some(secret), Some(options)) = (
            &self.recovery_secret,
            value.get_mut("options").and_then(Value::as_object_mut),
        ) {
            options.insert(
                "recoverySecret".to_string(),
                Value::String(secret.expose_secret().to_string()),
            );
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    fn options(value: Value) -> AccountOptions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_merge_preserves_missing_keys() {
        let mut stored = options(json!({ "email": "a@b.c", "userId": "u1", "theme": "dark" }));
        stored.merge(options(json!({ "sessionCookie": "c1", "lang": "en" })));

        assert_eq!(stored.email.as_deref(), Some("a@b.c"));
        assert_eq!(stored.user_id.as_deref(), Some("u1"));
        assert_eq!(stored.session_cookie.as_deref(), Some("c1"));
        assert_eq!(stored.extra["theme"], "dark");
        assert_eq!(stored.extra["lang"], "en");
    }

    #[test]
    fn test_transient_keys_never_survive() {
        let stored = options(json!({ "email": "a@b.c", "privateKey": "0x01" })).strip_transient();
        assert!(!stored.extra.contains_key("privateKey"));

        let mut merged = AccountOptions::default();
        merged.merge(options(json!({ "recoverySecret": "words" })));
        assert!(merged.extra.is_empty());
    }

    #[test]
    fn test_patched_keeps_read_only_fields() {
        let stored = Account::new_eoa(
            "id-1".to_string(),
            address!("0x00000000000000000000000000000000000000aa"),
            AccountOptions::default(),
        );
        let mut update = stored.clone();
        update.address = address!("0x00000000000000000000000000000000000000bb");
        update.methods.clear();
        update.options.email = Some("new@b.c".to_string());

        let next = stored.patched(update);
        assert_eq!(next.address, stored.address);
        assert_eq!(next.methods, stored.methods);
        assert_eq!(next.options.email.as_deref(), Some("new@b.c"));
    }

    #[test]
    fn test_account_wire_format() {
        let account = Account::new_eoa(
            "id-1".to_string(),
            address!("0x00000000000000000000000000000000000000aa"),
            AccountOptions::default(),
        );
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["type"], "eip155:eoa");
        assert!(value["methods"]
            .as_array()
            .unwrap()
            .contains(&json!("personal_sign")));
    }

    #[test]
    fn test_created_account_exposes_secret_only_in_return_value() {
        let created = CreatedAccount {
            account: Account::new_eoa(
                "id-1".to_string(),
                address!("0x00000000000000000000000000000000000000aa"),
                AccountOptions::default(),
            ),
            recovery_secret: Some(SecretString::from("recovery words")),
        };
        let value = created.to_json().unwrap();
        assert_eq!(value["options"]["recoverySecret"], "recovery words");
        assert!(!created.account.options.extra.contains_key("recoverySecret"));
    }
}
