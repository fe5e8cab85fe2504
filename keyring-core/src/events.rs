//! Notifications sent to the host runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};
use thiserror::Error;

use crate::account::Account;

/// Failure delivering an event to the host.
#[derive(Debug, Error)]
#[error("event_error: {0}")]
pub struct EventError(pub String);

/// Account lifecycle changes and request outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(tag = "event", content = "data")]
pub enum KeyringEvent {
    /// A new account exists.
    AccountCreated {
        /// The created account.
        account: Account,
    },
    /// An account's options changed.
    AccountUpdated {
        /// The account after the update.
        account: Account,
    },
    /// An account was removed.
    AccountDeleted {
        /// Id of the removed account.
        id: String,
    },
    /// A queued request was signed.
    RequestApproved {
        /// Request id.
        id: String,
        /// Method-specific result.
        result: Value,
    },
    /// A queued request was dropped without signing.
    RequestRejected {
        /// Request id.
        id: String,
    },
}

/// Channel through which the keyring notifies its host.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers `event`. An error aborts the operation that raised it.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses or does not receive the event.
    async fn emit(&self, event: &KeyringEvent) -> Result<(), EventError>;
}

/// Sink that only logs events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: &KeyringEvent) -> Result<(), EventError> {
        tracing::info!(event = %event, "keyring event");
        Ok(())
    }
}
