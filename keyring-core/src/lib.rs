//! Pending-operation account keyring.
//!
//! [`AccountKeyring`] manages signing accounts backed by an external MPC /
//! custodial wallet ([`SigningProvider`]) and a queue of signing requests that
//! are either executed inline (synchronous approvals) or held until an
//! explicit approve / reject. State is persisted through a [`StateStore`] and
//! host notifications go through an [`EventSink`].
//!
//! The [`rpc`] module exposes the keyring as a JSON-RPC method table with a
//! per-origin allow-list.

pub mod account;
pub use account::{Account, AccountOptions, AccountType, CreatedAccount};

mod chains;
pub use chains::is_evm_chain;

pub mod config;
pub use config::{Environment, KeyringConfig};

mod error;
pub use error::*;

pub mod events;
pub use events::{EventError, EventSink, KeyringEvent, TracingEventSink};

mod keyring;
pub use keyring::AccountKeyring;

pub mod logger;

pub mod memory;

pub mod provider;
pub use provider::{ProviderError, ProviderWallet, RawSignature, SigningProvider};

pub mod request;
pub use request::{KeyringRequest, Redirect, SubmitRequestResponse};

pub mod rpc;

pub mod signing;
pub use signing::EthMethod;

mod state;
pub use state::KeyringState;

pub mod store;
pub use store::{FileStateStore, StateStore, StoreError};
