//! `partsync-engine` - keeps a [`PartTree`](partsync_model::PartTree) in sync
//! with an external viewer.
//!
//! [`SyncContext`] owns the viewer transport and the mirrored tree. It loads
//! the model, serialises property writes and action executions through a
//! single in-flight slot, merges every delta the viewer answers with, and
//! publishes tree snapshots on a replay-latest stream.

#![forbid(unsafe_code)]

/// Session configuration.
pub mod config;
/// Synchronization context and model lifecycle.
pub mod context;
/// Mutation coordinator (property writes, actions, shortcut routing).
pub mod coordinator;
/// Error types.
pub mod error;
/// Recorded-session transport.
pub mod replay;
/// Viewer transport boundary.
pub mod transport;

pub use config::{NamingSettings, SyncConfig, ViewerSettings, CONFIG_FILES};
pub use context::SyncContext;
pub use coordinator::{ActionOutcome, Activity, MutationKind};
pub use error::{SyncError, TransportError};
pub use replay::{RecordedStep, Recording, ReplayTransport, ViewerCall};
pub use transport::{
    ActionParams, ActionResult, Compatibility, PropertyWrite, SetPropertiesPayload,
    ViewerOptions, ViewerTransport, ACTION_PARAMS_KEY,
};
