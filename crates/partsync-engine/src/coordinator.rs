//! Mutation coordinator.
//!
//! At most one property write or action is in flight per context. A second
//! caller is rejected with [`SyncError::Busy`] instead of being queued; the
//! flag is released when the transport answers, whatever the answer.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{error, info, trace, warn};

use partsync_model::{Property, PropertyValue, RefChain};

use crate::context::SyncContext;
use crate::error::SyncError;
use crate::transport::{
    ActionParams, ActionResult, SetPropertiesPayload, ViewerTransport, ACTION_PARAMS_KEY,
};

/// Kind of mutation holding the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    PropertyUpdate,
    Action,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::PropertyUpdate => "property update",
            MutationKind::Action => "action",
        }
    }

    fn tag(self) -> u8 {
        match self {
            MutationKind::PropertyUpdate => 1,
            MutationKind::Action => 2,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(MutationKind::PropertyUpdate),
            2 => Some(MutationKind::Action),
            _ => None,
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinator state as seen by activity subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Updating(MutationKind),
}

impl Activity {
    pub fn is_updating(self) -> bool {
        matches!(self, Activity::Updating(_))
    }
}

/// What an executed action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The viewer produced an artifact; its retrieval was started.
    Downloaded { url: String },
    /// Informational result. `body` is the message parsed as JSON, or the
    /// raw text when it is not JSON.
    Message { title: String, body: Value },
    /// The result was a model delta and has been merged.
    ModelUpdated,
}

/// Holds the in-flight flag; dropping it returns the coordinator to idle.
pub(crate) struct MutationGuard<'a> {
    flag: &'a AtomicU8,
    activity: &'a watch::Sender<Activity>,
}

impl<'a> MutationGuard<'a> {
    pub(crate) fn acquire(
        flag: &'a AtomicU8,
        activity: &'a watch::Sender<Activity>,
        kind: MutationKind,
    ) -> Result<Self, SyncError> {
        match flag.compare_exchange(0, kind.tag(), Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                activity.send_replace(Activity::Updating(kind));
                Ok(Self { flag, activity })
            }
            Err(current) => {
                let in_flight = MutationKind::from_tag(current).unwrap_or(kind);
                warn!("Unable to start {kind} while another {in_flight} is in progress");
                Err(SyncError::Busy {
                    operation: kind,
                    in_flight,
                })
            }
        }
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        // publish before releasing, so a successor's `Updating` lands last
        self.activity.send_replace(Activity::Idle);
        self.flag.store(0, Ordering::Release);
    }
}

impl<T: ViewerTransport> SyncContext<T> {
    /// Sends a property write to the viewer and merges the delta it answers
    /// with.
    pub async fn update_properties(&self, payload: SetPropertiesPayload) -> Result<(), SyncError> {
        let _guard = self.begin_mutation(MutationKind::PropertyUpdate)?;
        let description = payload.describe();
        let model_data = match self.viewer().set_property_values(payload).await {
            Ok(model_data) => model_data,
            Err(err) => {
                error!("Error updating {description}: {err}");
                return Err(self.record_error(err.into()));
            }
        };
        self.merge_model_data(model_data, true)?;
        Ok(())
    }

    pub async fn update_property(
        &self,
        ref_chain: &str,
        name: &str,
        value: Option<PropertyValue>,
    ) -> Result<(), SyncError> {
        self.update_properties(SetPropertiesPayload::single(
            RefChain::new(ref_chain),
            name,
            value,
        ))
        .await
    }

    /// Writes `null`, asking the viewer to restore the rule's default.
    pub async fn reset_property(&self, ref_chain: &str, name: &str) -> Result<(), SyncError> {
        self.update_property(ref_chain, name, None).await
    }

    pub async fn reset_property_of(&self, property: &Property) -> Result<(), SyncError> {
        self.reset_property(property.part().as_str(), property.ui_rule_name())
            .await
    }

    /// Runs an action. Parameters, when present, are first handed to the
    /// viewer through the [`ACTION_PARAMS_KEY`] side channel.
    pub async fn execute_action(&self, params: ActionParams) -> Result<ActionOutcome, SyncError> {
        let _guard = self.begin_mutation(MutationKind::Action)?;
        let name = params.name.clone();
        info!("Executing action {name} on {}", params.ref_chain);

        if let Some(extra) = &params.params {
            let encoded = serde_json::to_string(extra)
                .map_err(|err| self.record_error(SyncError::Encode(err.to_string().into())))?;
            let mut values = Map::new();
            values.insert(ACTION_PARAMS_KEY.to_string(), Value::String(encoded));
            if let Err(err) = self
                .viewer()
                .set_property_values(SetPropertiesPayload::Values(values))
                .await
            {
                error!("Passing parameters of action {name} failed: {err}");
                return Err(self.record_error(err.into()));
            }
        }

        let result = match self.viewer().execute_action(params).await {
            Ok(result) => result,
            Err(err) => {
                error!("Error occurred while executing action {name}: {err}");
                return Err(self.record_error(err.into()));
            }
        };

        match ActionResult::classify(result) {
            ActionResult::Download { url } => {
                self.viewer().fetch_artifact(&url);
                Ok(ActionOutcome::Downloaded { url })
            }
            ActionResult::Message { title, message } => {
                let body = match serde_json::from_str(&message) {
                    Ok(body) => body,
                    Err(err) => {
                        trace!("Action message is not JSON ({err}); keeping raw text");
                        Value::String(message)
                    }
                };
                Ok(ActionOutcome::Message { title, body })
            }
            ActionResult::ModelData(model_data) => {
                self.merge_model_data(model_data, true)?;
                Ok(ActionOutcome::ModelUpdated)
            }
        }
    }

    /// Writes `value` through the property shortcut `shortcut` of a part.
    pub async fn set_shortcut_value(
        &self,
        ref_chain: &str,
        shortcut: &str,
        value: Option<PropertyValue>,
    ) -> Result<(), SyncError> {
        let rule = self.shortcut_rule(ref_chain, shortcut)?;
        self.update_property(ref_chain, &rule, value).await
    }

    /// Reads the value behind the property shortcut `shortcut` of a part.
    pub fn shortcut_value(
        &self,
        ref_chain: &str,
        shortcut: &str,
    ) -> Result<Option<PropertyValue>, SyncError> {
        let part = self
            .part(ref_chain)
            .ok_or_else(|| SyncError::UnknownPart(ref_chain.into()))?;
        let property = part
            .shortcut_property(shortcut)
            .ok_or_else(|| unknown_shortcut(ref_chain, shortcut))?;
        Ok(property.value().cloned())
    }

    /// Runs the action bound to shortcut `name` on a part.
    pub async fn invoke_action(
        &self,
        ref_chain: &str,
        name: &str,
        params: Option<Value>,
    ) -> Result<ActionOutcome, SyncError> {
        let part = self
            .part(ref_chain)
            .ok_or_else(|| SyncError::UnknownPart(ref_chain.into()))?;
        let binding = part
            .action_binding(name)
            .ok_or_else(|| unknown_shortcut(ref_chain, name))?;
        self.execute_action(ActionParams {
            ref_chain: binding.ref_chain.clone(),
            name: binding.name.clone(),
            params,
        })
        .await
    }

    fn shortcut_rule(&self, ref_chain: &str, shortcut: &str) -> Result<String, SyncError> {
        let part = self
            .part(ref_chain)
            .ok_or_else(|| SyncError::UnknownPart(ref_chain.into()))?;
        part.shortcut_property(shortcut)
            .map(|property| property.ui_rule_name().to_string())
            .ok_or_else(|| unknown_shortcut(ref_chain, shortcut))
    }
}

fn unknown_shortcut(ref_chain: &str, name: &str) -> SyncError {
    SyncError::UnknownShortcut {
        ref_chain: ref_chain.into(),
        name: name.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_second_mutation_and_resets_on_drop() {
        let flag = AtomicU8::new(0);
        let (activity, rx) = watch::channel(Activity::Idle);

        let guard = MutationGuard::acquire(&flag, &activity, MutationKind::PropertyUpdate).unwrap();
        assert_eq!(*rx.borrow(), Activity::Updating(MutationKind::PropertyUpdate));

        let Err(err) = MutationGuard::acquire(&flag, &activity, MutationKind::Action) else {
            panic!("second mutation should be rejected");
        };
        assert_eq!(
            err,
            SyncError::Busy {
                operation: MutationKind::Action,
                in_flight: MutationKind::PropertyUpdate,
            }
        );
        assert_eq!(
            err.to_string(),
            "cannot start action: another property update is in progress"
        );

        drop(guard);
        assert_eq!(flag.load(Ordering::Acquire), 0);
        assert_eq!(*rx.borrow(), Activity::Idle);
        assert!(MutationGuard::acquire(&flag, &activity, MutationKind::Action).is_ok());
    }

    #[test]
    fn holder_always_sees_its_own_activity() {
        let flag = AtomicU8::new(0);
        let (activity, rx) = watch::channel(Activity::Idle);

        std::thread::scope(|scope| {
            for kind in [MutationKind::PropertyUpdate, MutationKind::Action]
                .into_iter()
                .cycle()
                .take(8)
            {
                let (flag, activity, rx) = (&flag, &activity, rx.clone());
                scope.spawn(move || {
                    for _ in 0..500 {
                        if let Ok(guard) = MutationGuard::acquire(flag, activity, kind) {
                            assert_eq!(*rx.borrow(), Activity::Updating(kind));
                            drop(guard);
                        }
                    }
                });
            }
        });

        assert_eq!(flag.load(Ordering::Acquire), 0);
        assert_eq!(*rx.borrow(), Activity::Idle);
    }

    #[test]
    fn tags_round_trip() {
        for kind in [MutationKind::PropertyUpdate, MutationKind::Action] {
            assert_eq!(MutationKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MutationKind::from_tag(0), None);
    }
}
