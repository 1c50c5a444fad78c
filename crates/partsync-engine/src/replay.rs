//! Viewer transport that serves a recorded session.
//!
//! A recording holds the initial model data plus the ordered property writes
//! and action executions of a session, each with the response (or error) the
//! viewer gave. [`ReplayTransport`] answers calls from those queues and keeps
//! a log of everything it was asked to do.

use std::collections::VecDeque;
use std::future::{ready, Future};

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use partsync_model::RefChain;

use crate::error::TransportError;
use crate::transport::{
    ActionParams, Compatibility, SetPropertiesPayload, ViewerOptions, ViewerTransport,
};

/// A recorded viewer session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub compatibility: Option<Compatibility>,
    /// Model data returned by the initial full fetch.
    pub initial: Value,
    #[serde(default)]
    pub steps: Vec<RecordedStep>,
}

impl Recording {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// A recording with only the initial model and no steps.
    #[must_use]
    pub fn model_only(initial: Value) -> Self {
        Self {
            compatibility: None,
            initial,
            steps: Vec::new(),
        }
    }
}

/// One recorded mutation with the viewer's answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordedStep {
    SetProperty {
        #[serde(rename = "refChain")]
        ref_chain: RefChain,
        name: String,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        response: Value,
        #[serde(default)]
        error: Option<String>,
    },
    ExecuteAction {
        #[serde(rename = "refChain")]
        ref_chain: RefChain,
        name: String,
        #[serde(default)]
        params: Option<Value>,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<String>,
    },
}

/// A call received by the replay transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCall {
    CheckCompatibility,
    Initialize(ViewerOptions),
    GetPropertyValues,
    SetPropertyValues(SetPropertiesPayload),
    ExecuteAction(ActionParams),
    FetchArtifact(String),
    Unload,
}

#[derive(Debug)]
struct Reply {
    ref_chain: RefChain,
    name: String,
    outcome: Result<Value, TransportError>,
}

impl Reply {
    fn new(ref_chain: &RefChain, name: &str, response: &Value, error: Option<&String>) -> Self {
        Self {
            ref_chain: ref_chain.clone(),
            name: name.to_string(),
            outcome: error.map_or_else(
                || Ok(response.clone()),
                |message| Err(TransportError::new(message.clone())),
            ),
        }
    }

    /// Answers a call against `ref_chain`/`name`, refusing one that does not
    /// match the recording.
    fn answer(self, ref_chain: &RefChain, name: &str) -> Result<Value, TransportError> {
        if &self.ref_chain != ref_chain || self.name != name {
            warn!(
                "Replay expected {}:{} but received {ref_chain}:{name}",
                self.ref_chain, self.name
            );
            return Err(TransportError::new(format!(
                "unexpected call {ref_chain}:{name}, recording has {}:{}",
                self.ref_chain, self.name
            )));
        }
        self.outcome
    }
}

/// Serves a [`Recording`].
#[derive(Debug)]
pub struct ReplayTransport {
    compatibility: Compatibility,
    initial: Value,
    writes: Mutex<VecDeque<Reply>>,
    actions: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<ViewerCall>>,
}

impl ReplayTransport {
    #[must_use]
    pub fn new(recording: &Recording) -> Self {
        let mut writes = VecDeque::new();
        let mut actions = VecDeque::new();
        for step in &recording.steps {
            match step {
                RecordedStep::SetProperty {
                    ref_chain,
                    name,
                    response,
                    error,
                    ..
                } => writes.push_back(Reply::new(ref_chain, name, response, error.as_ref())),
                RecordedStep::ExecuteAction {
                    ref_chain,
                    name,
                    result,
                    error,
                    ..
                } => actions.push_back(Reply::new(ref_chain, name, result, error.as_ref())),
            }
        }
        Self {
            compatibility: recording
                .compatibility
                .clone()
                .unwrap_or_else(Compatibility::compatible),
            initial: recording.initial.clone(),
            writes: Mutex::new(writes),
            actions: Mutex::new(actions),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<ViewerCall> {
        self.calls.lock().clone()
    }

    /// URLs of artifacts requested by actions.
    pub fn artifacts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ViewerCall::FetchArtifact(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded answers not consumed yet.
    pub fn pending(&self) -> usize {
        self.writes.lock().len() + self.actions.lock().len()
    }

    fn record(&self, call: ViewerCall) {
        self.calls.lock().push(call);
    }

    fn next_write(&self, payload: &SetPropertiesPayload) -> Result<Value, TransportError> {
        let (ref_chain, name) = match payload {
            SetPropertiesPayload::Properties {
                ref_chain,
                properties,
            } => match properties.first() {
                Some(write) => (ref_chain, write.name.as_str()),
                None => return Err(TransportError::new("property write without properties")),
            },
            // action parameters are acknowledged without a recorded step
            SetPropertiesPayload::Values(_) => return Ok(Value::Null),
        };
        let reply = self
            .writes
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::new(format!("no recorded write for {ref_chain}:{name}")))?;
        reply.answer(ref_chain, name)
    }

    fn next_action(&self, params: &ActionParams) -> Result<Value, TransportError> {
        let reply = self.actions.lock().pop_front().ok_or_else(|| {
            TransportError::new(format!(
                "no recorded result for action {}:{}",
                params.ref_chain, params.name
            ))
        })?;
        reply.answer(&params.ref_chain, &params.name)
    }
}

impl ViewerTransport for ReplayTransport {
    fn check_compatibility(&self) -> impl Future<Output = Compatibility> + Send {
        self.record(ViewerCall::CheckCompatibility);
        ready(self.compatibility.clone())
    }

    fn initialize(
        &self,
        options: ViewerOptions,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        debug!("Replay viewer initialized for design {}", options.design);
        self.record(ViewerCall::Initialize(options));
        ready(Ok(()))
    }

    fn get_property_values(
        &self,
        _filter: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        self.record(ViewerCall::GetPropertyValues);
        ready(Ok(self.initial.clone()))
    }

    fn set_property_values(
        &self,
        payload: SetPropertiesPayload,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let answer = self.next_write(&payload);
        self.record(ViewerCall::SetPropertyValues(payload));
        ready(answer)
    }

    fn execute_action(
        &self,
        params: ActionParams,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let answer = self.next_action(&params);
        self.record(ViewerCall::ExecuteAction(params));
        ready(answer)
    }

    fn fetch_artifact(&self, url: &str) {
        self.record(ViewerCall::FetchArtifact(url.to_string()));
    }

    fn unload(&self) {
        self.record(ViewerCall::Unload);
    }
}
