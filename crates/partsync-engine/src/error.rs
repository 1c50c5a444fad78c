//! Synchronization errors.

use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;

use crate::coordinator::MutationKind;

/// Failure reported by the viewer transport.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub detail: Option<Value>,
}

impl TransportError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Errors surfaced by the synchronization context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Another mutation is in flight; retry once it settles.
    #[error("cannot start {operation}: another {in_flight} is in progress")]
    Busy {
        operation: MutationKind,
        in_flight: MutationKind,
    },

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(SmolStr),

    /// The viewer rejected a handshake, load, write or action.
    #[error("viewer transport failed: {0}")]
    Transport(#[from] TransportError),

    /// Model data could not be read as a delta.
    #[error("malformed model delta: {0}")]
    MalformedDelta(SmolStr),

    /// No part is registered under the ref chain.
    #[error("unknown part '{0}'")]
    UnknownPart(SmolStr),

    /// The part has no shortcut of that name.
    #[error("part '{ref_chain}' has no shortcut '{name}'")]
    UnknownShortcut { ref_chain: SmolStr, name: SmolStr },

    /// A payload could not be encoded for the viewer.
    #[error("failed to encode payload: {0}")]
    Encode(SmolStr),
}

impl SyncError {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncError::Busy { .. })
    }
}
