//! Synchronization context.
//!
//! Owns the viewer transport, the mirrored [`PartTree`] and the naming
//! policy. The tree is only replaced through merge passes; readers get
//! immutable snapshots, so a published tree is never observed half merged.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use smol_str::SmolStr;
use tokio::sync::watch;
use tracing::{debug, error, info};

use partsync_model::{
    apply_delta, project, DefaultNamingStrategy, MergeReport, NamingStrategy, Part, PartDelta,
    PartTree, PropertyValue,
};

use crate::config::SyncConfig;
use crate::coordinator::{Activity, MutationGuard, MutationKind};
use crate::error::{SyncError, TransportError};
use crate::transport::{ViewerOptions, ViewerTransport};

#[derive(Debug, Default)]
struct ModelState {
    tree: Arc<PartTree>,
    dirty: bool,
    last_error: Option<SyncError>,
}

/// The engine's single entry point.
pub struct SyncContext<T> {
    config: SyncConfig,
    design_key: RwLock<Option<SmolStr>>,
    transport: T,
    /// Set once the viewer accepted `initialize`; cleared on unload.
    viewer_ready: AtomicBool,
    naming: RwLock<Arc<dyn NamingStrategy>>,
    state: Mutex<ModelState>,
    /// 0 while idle, otherwise the tag of the in-flight [`MutationKind`].
    in_flight: AtomicU8,
    model_tx: watch::Sender<Option<Arc<PartTree>>>,
    activity_tx: watch::Sender<Activity>,
}

impl<T: ViewerTransport> SyncContext<T> {
    pub fn new(config: SyncConfig, transport: T) -> Self {
        let naming = DefaultNamingStrategy::with_replacement(
            config.naming.invalid_character_replacement.clone(),
        );
        let (model_tx, _) = watch::channel(None);
        let (activity_tx, _) = watch::channel(Activity::Idle);
        Self {
            design_key: RwLock::new(config.design_key.clone()),
            config,
            transport,
            viewer_ready: AtomicBool::new(false),
            naming: RwLock::new(Arc::new(naming)),
            state: Mutex::new(ModelState::default()),
            in_flight: AtomicU8::new(0),
            model_tx,
            activity_tx,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The owned viewer transport.
    pub fn viewer(&self) -> &T {
        &self.transport
    }

    pub fn design_key(&self) -> Option<SmolStr> {
        self.design_key.read().clone()
    }

    /// Replaces the session key; a blank key unsets it.
    pub fn set_design_key(&self, key: impl Into<SmolStr>) {
        let key: SmolStr = key.into();
        let key = (!key.trim().is_empty()).then(|| SmolStr::new(key.trim()));
        *self.design_key.write() = key;
    }

    /// Swaps the naming policy and re-projects the current tree with it.
    pub fn set_naming_strategy(&self, naming: impl NamingStrategy + 'static) {
        let naming: Arc<dyn NamingStrategy> = Arc::new(naming);
        *self.naming.write() = Arc::clone(&naming);
        let mut state = self.state.lock();
        if state.tree.is_empty() {
            return;
        }
        project(Arc::make_mut(&mut state.tree), naming.as_ref());
        self.publish(&state);
    }

    /// Starts a fresh session and loads the full model from the viewer.
    pub async fn load_model(&self) -> Result<Arc<PartTree>, SyncError> {
        self.initialize_viewer(None).await
    }

    /// Like [`load_model`](Self::load_model), but the viewer opens the given
    /// model file instead of the design's default model.
    pub async fn load_model_from_file(&self, model: Vec<u8>) -> Result<Arc<PartTree>, SyncError> {
        self.initialize_viewer(Some(model)).await
    }

    async fn initialize_viewer(&self, model: Option<Vec<u8>>) -> Result<Arc<PartTree>, SyncError> {
        let Some(design) = self.design_key() else {
            return Err(self.record_error(SyncError::Configuration(
                "no design key set before loading the model".into(),
            )));
        };
        self.clear_model();
        info!("Loading model for design {design}");

        let compatibility = self.transport.check_compatibility().await;
        if !compatibility.compatible {
            let reason = compatibility
                .reason
                .unwrap_or_else(|| "viewer reported an incompatible client".to_string());
            error!("Viewer compatibility check failed: {reason}");
            return Err(self.record_error(TransportError::new(reason).into()));
        }

        let options = ViewerOptions {
            design,
            container: self.config.viewer.container_id.clone(),
            panes: self.config.viewer.panes,
            verbose: self.config.viewer.verbose,
            open_from_file: model,
        };
        if let Err(err) = self.transport.initialize(options).await {
            error!("Viewer failed to load: {err}");
            return Err(self.record_error(err.into()));
        }
        self.viewer_ready.store(true, Ordering::Release);

        let model_data = match self.transport.get_property_values(None).await {
            Ok(model_data) => model_data,
            Err(err) => {
                error!("Fetching the model failed: {err}");
                return Err(self.record_error(err.into()));
            }
        };
        self.merge_model_data(model_data, false)?;
        let tree = self.snapshot();
        info!("Model loaded with {} parts", tree.len());
        Ok(tree)
    }

    /// Merges model data pushed by the viewer outside a mutation.
    pub fn apply_model_data(&self, model_data: Value) -> Result<MergeReport, SyncError> {
        self.merge_model_data(model_data, false)
    }

    /// Drops the current model and releases the viewer.
    pub fn end_session(&self) {
        info!("Ending session");
        self.clear_model();
    }

    fn clear_model(&self) {
        {
            let mut state = self.state.lock();
            state.tree = Arc::new(PartTree::new());
            state.dirty = false;
            self.model_tx.send_replace(None);
        }
        if self.viewer_ready.swap(false, Ordering::AcqRel) {
            self.transport.unload();
        }
    }

    /// Parses, merges and projects one delta, then publishes the new tree.
    ///
    /// On a malformed delta the tree is left as it was.
    pub(crate) fn merge_model_data(
        &self,
        model_data: Value,
        mark_dirty: bool,
    ) -> Result<MergeReport, SyncError> {
        let delta = PartDelta::from_value(model_data).map_err(|err| {
            error!("Discarding malformed model data: {err}");
            self.record_error(SyncError::MalformedDelta(err.to_string().into()))
        })?;
        let naming = self.naming_strategy();
        let mut state = self.state.lock();
        let tree = Arc::make_mut(&mut state.tree);
        let (merged, report) = apply_delta(tree, &delta);
        project(tree, naming.as_ref());
        debug!("Merged {} nodes under {merged}", delta.node_count());
        if mark_dirty {
            state.dirty = true;
        }
        self.publish(&state);
        Ok(report)
    }

    /// Publishes a rooted tree. Runs under the state lock so the stream
    /// never falls behind [`snapshot`](Self::snapshot).
    fn publish(&self, state: &ModelState) {
        if state.tree.root().is_some() {
            self.model_tx.send_replace(Some(Arc::clone(&state.tree)));
        }
    }

    pub(crate) fn begin_mutation(&self, kind: MutationKind) -> Result<MutationGuard<'_>, SyncError> {
        MutationGuard::acquire(&self.in_flight, &self.activity_tx, kind)
    }

    pub(crate) fn record_error(&self, err: SyncError) -> SyncError {
        self.state.lock().last_error = Some(err.clone());
        err
    }

    fn naming_strategy(&self) -> Arc<dyn NamingStrategy> {
        Arc::clone(&self.naming.read())
    }

    /// Current tree snapshot.
    pub fn snapshot(&self) -> Arc<PartTree> {
        Arc::clone(&self.state.lock().tree)
    }

    pub fn root(&self) -> Option<Part> {
        self.state.lock().tree.root().cloned()
    }

    pub fn parts(&self) -> Vec<Part> {
        self.state.lock().tree.all().cloned().collect()
    }

    pub fn part(&self, ref_chain: &str) -> Option<Part> {
        self.state.lock().tree.get(ref_chain).cloned()
    }

    /// First part of `part_type` whose property shortcut `property` holds
    /// `value`. Integer and floating point amounts match each other.
    pub fn find_part_by_property(
        &self,
        part_type: &str,
        property: &str,
        value: &PropertyValue,
    ) -> Option<Part> {
        let tree = self.snapshot();
        let found = tree
            .all()
            .filter(|part| part.part_type() == part_type)
            .find(|part| {
                part.shortcut_property(property)
                    .and_then(|property| property.value())
                    .is_some_and(|current| current.loosely_eq(value))
            })
            .cloned();
        found
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    pub fn is_model_loaded(&self) -> bool {
        self.state.lock().tree.root().is_some()
    }

    pub fn is_updating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) != 0
    }

    pub fn last_error(&self) -> Option<SyncError> {
        self.state.lock().last_error.clone()
    }

    /// Model stream. New subscribers see the latest tree immediately;
    /// `None` means no model is loaded.
    pub fn subscribe_model(&self) -> watch::Receiver<Option<Arc<PartTree>>> {
        self.model_tx.subscribe()
    }

    pub fn subscribe_activity(&self) -> watch::Receiver<Activity> {
        self.activity_tx.subscribe()
    }
}
