//! Signing requests and submission outcomes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A cryptographic operation awaiting (or undergoing) approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyringRequest {
    /// Caller-supplied id correlating submission and approval.
    pub id: String,
    /// The operation to perform.
    pub request: RequestPayload,
}

/// Method name plus positional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Method from the signing vocabulary (e.g. `personal_sign`).
    pub method: String,
    /// Positional parameters for the method.
    #[serde(default)]
    pub params: Value,
}

impl KeyringRequest {
    /// Builds a request from its parts.
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            request: RequestPayload {
                method: method.into(),
                params,
            },
        }
    }
}

/// Where the human user should go to resume a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    /// Companion dapp URL.
    pub url: String,
    /// Optional hint shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of [`crate::AccountKeyring::submit_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequestResponse {
    /// The request will be (or must be re-) resolved out of band.
    Pending {
        /// Where to continue.
        redirect: Option<Redirect>,
    },
    /// The request was executed inline.
    Completed {
        /// Method-specific result.
        result: Value,
    },
}

impl SubmitRequestResponse {
    /// Whether the caller must wait for an out-of-band resolution.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// On-the-wire shape: `{pending, redirect?}` or `{pending, result}`.
#[derive(Serialize, Deserialize)]
struct SubmitRequestResponseWire {
    pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    redirect: Option<Redirect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl Serialize for SubmitRequestResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Pending { redirect } => SubmitRequestResponseWire {
                pending: true,
                redirect: redirect.clone(),
                result: None,
            },
            Self::Completed { result } => SubmitRequestResponseWire {
                pending: false,
                redirect: None,
                result: Some(result.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubmitRequestResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SubmitRequestResponseWire::deserialize(deserializer)?;
        Ok(if wire.pending {
            Self::Pending {
                redirect: wire.redirect,
            }
        } else {
            Self::Completed {
                result: wire.result.unwrap_or(Value::Null),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_wire_format() {
        let response = SubmitRequestResponse::Pending {
            redirect: Some(Redirect {
                url: "https://dapp.example/".to_string(),
                message: None,
            }),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "pending": true, "redirect": { "url": "https://dapp.example/" } })
        );
    }

    #[test]
    fn test_completed_wire_format() {
        let value = json!({ "pending": false, "result": "0xabcd" });
        let response: SubmitRequestResponse = serde_json::from_value(value.clone()).unwrap();
        assert!(!response.is_pending());
        assert_eq!(serde_json::to_value(&response).unwrap(), value);
    }

    #[test]
    fn test_request_params_default_to_null() {
        let request: KeyringRequest =
            serde_json::from_value(json!({ "id": "r1", "request": { "method": "eth_sign" } }))
                .unwrap();
        assert_eq!(request.request.params, Value::Null);
    }
}
