//! Shared fixtures for engine scenarios.
#![allow(dead_code, unused_imports)]

use std::future::Future;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

pub use partsync_engine::{
    ActionOutcome, ActionParams, Activity, Compatibility, MutationKind, Recording,
    ReplayTransport, SetPropertiesPayload, SyncConfig, SyncContext, SyncError, TransportError,
    ViewerCall, ViewerOptions, ViewerTransport,
};
pub use partsync_model::{PropertyValue, RefChain};

pub const DESIGN_KEY: &str = "575458448649916390/2gn1";

pub fn config() -> SyncConfig {
    SyncConfig {
        design_key: Some(DESIGN_KEY.into()),
        ..SyncConfig::default()
    }
}

/// Bike assembly with two wheels in a collection and an `Export` action.
pub fn bike_model() -> Value {
    json!({
        "refChain": "Root",
        "Name": "Bike",
        "PartType": "Assembly",
        "properties": [
            {"name": "Length", "value": {
                "FullName": "Length",
                "Value": 1.5,
                "Tooltip": "{\"ToolTip\":\"Length\",\"DataType\":\"Number\",\"CustomData\":null}"
            }},
            {"name": "Frame Size", "value": {"FullName": "Frame Size", "Value": 54}}
        ],
        "Messages": [{"Text": "m0", "Severity": "Info"}],
        "Actions": [{"Name": "Export"}],
        "children": [
            {"refChain": "Root.Frame", "Name": "Frame", "PartType": "Frame",
             "properties": [{"name": "Material", "value": {"FullName": "Material", "Value": "Steel"}}]},
            {
                "refChain": "Root.Wheels",
                "Name": "WheelCollection",
                "PartType": "Collection",
                "children": [
                    {"refChain": "Root.Wheels.Front", "Name": "Front", "PartType": "Wheel",
                     "properties": [{"name": "Size", "value": {"FullName": "Size", "Value": "29in"}}]},
                    {"refChain": "Root.Wheels.Rear", "Name": "Rear", "PartType": "Wheel",
                     "properties": [{"name": "Size", "value": {"FullName": "Size", "Value": "27in"}}]}
                ]
            }
        ]
    })
}

/// Delta the viewer answers with after `Length` was written.
pub fn length_changed(length: f64) -> Value {
    json!({
        "refChain": "Root",
        "Name": "Bike",
        "PartType": "Assembly",
        "properties": [{"name": "Length", "value": {
            "FullName": "Length",
            "Value": length,
            "Tooltip": "{\"ToolTip\":\"Length\",\"DataType\":\"Number\",\"CustomData\":null}"
        }}],
        "Messages": [{"Text": "m0", "Severity": "Info"}],
        "Actions": [{"Name": "Export"}]
    })
}

pub fn recording(steps: Value) -> Recording {
    Recording::from_value(json!({"initial": bike_model(), "steps": steps}))
        .expect("valid recording")
}

pub fn context(steps: Value) -> SyncContext<ReplayTransport> {
    SyncContext::new(config(), ReplayTransport::new(&recording(steps)))
}

pub async fn loaded(steps: Value) -> SyncContext<ReplayTransport> {
    let ctx = context(steps);
    ctx.load_model().await.expect("model loads");
    ctx
}

/// Replay viewer whose next property write waits until the test opens the
/// gate.
pub struct GatedViewer {
    inner: ReplayTransport,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedViewer {
    pub fn new(recording: &Recording) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let viewer = Self {
            inner: ReplayTransport::new(recording),
            gate: Mutex::new(Some(rx)),
        };
        (viewer, tx)
    }

    pub fn inner(&self) -> &ReplayTransport {
        &self.inner
    }
}

impl ViewerTransport for GatedViewer {
    fn check_compatibility(&self) -> impl Future<Output = Compatibility> + Send {
        self.inner.check_compatibility()
    }

    fn initialize(
        &self,
        options: ViewerOptions,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.inner.initialize(options)
    }

    fn get_property_values(
        &self,
        filter: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        self.inner.get_property_values(filter)
    }

    fn set_property_values(
        &self,
        payload: SetPropertiesPayload,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let gate = self.gate.lock().take();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.set_property_values(payload).await
        }
    }

    fn execute_action(
        &self,
        params: ActionParams,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        self.inner.execute_action(params)
    }

    fn fetch_artifact(&self, url: &str) {
        self.inner.fetch_artifact(url);
    }

    fn unload(&self) {
        self.inner.unload();
    }
}
