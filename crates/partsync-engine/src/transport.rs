//! Boundary with the external viewer.
//!
//! The viewer owns the real model; the engine only asks it for model data,
//! writes property values, and executes actions. All calls are async and the
//! engine never issues more than one write at a time.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::error::TransportError;
use partsync_model::{PropertyValue, RefChain};

/// Side-channel key used to hand action parameters to the viewer.
pub const ACTION_PARAMS_KEY: &str = "uiActionParams";

/// Result of the client compatibility handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub compatible: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Compatibility {
    #[must_use]
    pub fn compatible() -> Self {
        Self {
            compatible: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self {
            compatible: false,
            reason: Some(reason.into()),
        }
    }
}

/// Options handed to the viewer when it is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerOptions {
    pub design: SmolStr,
    pub container: String,
    pub panes: bool,
    pub verbose: bool,
    pub open_from_file: Option<Vec<u8>>,
}

/// One property write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyWrite {
    pub name: String,
    pub value: Option<PropertyValue>,
}

/// Payload of a `setPropertyValues` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SetPropertiesPayload {
    /// Writes to named properties of one part.
    Properties {
        #[serde(rename = "refChain")]
        ref_chain: RefChain,
        properties: Vec<PropertyWrite>,
    },
    /// Arbitrary key/value map (used for the action-parameter side channel).
    Values(Map<String, Value>),
}

impl SetPropertiesPayload {
    #[must_use]
    pub fn single(ref_chain: RefChain, name: impl Into<String>, value: Option<PropertyValue>) -> Self {
        SetPropertiesPayload::Properties {
            ref_chain,
            properties: vec![PropertyWrite {
                name: name.into(),
                value,
            }],
        }
    }

    /// Describes the write for log output.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            SetPropertiesPayload::Properties {
                ref_chain,
                properties,
            } => {
                let names = properties
                    .iter()
                    .map(|write| write.name.as_str())
                    .collect::<Vec<_>>();
                format!("{ref_chain}: {}", names.join(", "))
            }
            SetPropertiesPayload::Values(values) => {
                let keys = values.keys().map(String::as_str).collect::<Vec<_>>();
                format!("[{}]", keys.join(", "))
            }
        }
    }
}

/// Parameters of an action execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParams {
    #[serde(rename = "refChain")]
    pub ref_chain: RefChain,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Classified result of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Downloadable artifact.
    Download { url: String },
    /// Informational message; `message` is the raw text.
    Message { title: String, message: String },
    /// Anything else is model data.
    ModelData(Value),
}

impl ActionResult {
    #[must_use]
    pub fn classify(value: Value) -> Self {
        if let Some(url) = value
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
        {
            return ActionResult::Download {
                url: url.to_string(),
            };
        }
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty());
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty());
        if let (Some(title), Some(message)) = (title, message) {
            return ActionResult::Message {
                title: title.to_string(),
                message: message.to_string(),
            };
        }
        ActionResult::ModelData(value)
    }
}

/// The external viewer.
///
/// Implementations answer each request exactly once; a call that never
/// resolves keeps the coordinator busy.
pub trait ViewerTransport: Send + Sync {
    fn check_compatibility(&self) -> impl Future<Output = Compatibility> + Send;

    fn initialize(
        &self,
        options: ViewerOptions,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Full model fetch.
    fn get_property_values(
        &self,
        filter: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn set_property_values(
        &self,
        payload: SetPropertiesPayload,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn execute_action(
        &self,
        params: ActionParams,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// Fire-and-forget retrieval of an artifact produced by an action.
    fn fetch_artifact(&self, url: &str);

    /// Releases the viewer; called when the model is cleared.
    fn unload(&self);
}
