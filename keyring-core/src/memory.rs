//! In-memory implementations of the collaborator traits.
//!
//! Nothing here is durable. They exist for tests and for embedders that
//! persist the state themselves.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    events::{EventError, EventSink, KeyringEvent},
    state::KeyringState,
    store::{StateStore, StoreError, StoreResult},
};

// =============================================================================
// Memory state store
// =============================================================================

/// State store keeping the last saved state in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<KeyringState>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `state`.
    #[must_use]
    pub fn with_state(state: KeyringState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// The last saved state.
    #[must_use]
    pub fn snapshot(&self) -> Option<KeyringState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> StoreResult<Option<KeyringState>> {
        let guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    async fn save(&self, state: &KeyringState) -> StoreResult<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".to_string()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}

// =============================================================================
// Recording event sink
// =============================================================================

/// Event sink that records every delivered event.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<KeyringEvent>>,
}

impl RecordingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<KeyringEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: &KeyringEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError("event log poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
