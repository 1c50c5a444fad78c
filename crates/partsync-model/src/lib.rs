//! `partsync-model` - the mirrored part tree and its incremental merge.
//!
//! The crate is synchronous and transport-agnostic: it turns loosely typed
//! viewer payloads into [`Part`]s and [`Property`]s, reconciles incremental
//! deltas into a [`PartTree`], and rebuilds the per-part shortcut maps that
//! consumers use to address properties, children, collections and actions
//! by name.

#![forbid(unsafe_code)]

/// Wire shapes of model deltas as emitted by the viewer.
pub mod delta;
/// Property metadata parsing (tooltip documents, type inference, choice lists).
pub mod metadata;
/// Incremental merge of deltas into the part tree.
pub mod merge;
/// Collection naming and identifier sanitisation policy.
pub mod naming;
/// Plain-text outline of a part tree.
pub mod outline;
/// Parts and their action/message snapshots.
pub mod part;
/// Shortcut projection over merged parts.
pub mod projection;
/// Typed properties.
pub mod property;
mod ref_chain;
/// Arena storage of parts keyed by ref chain.
pub mod tree;
/// Closed property value union and data types.
pub mod value;

pub use delta::{PartDelta, RawChoice, RawProperty, RawPropertyEntry};
pub use merge::{apply_delta, MergeReport};
pub use naming::{sanitize_identifier, DefaultNamingStrategy, NamingStrategy};
pub use part::{Action, ActionBinding, Message, Part, Severity, Shortcuts};
pub use projection::project;
pub use property::{ChoiceItem, Property, UpdateTrigger};
pub use ref_chain::{RefChain, ROOT_REF_CHAIN};
pub use tree::PartTree;
pub use value::{DataType, InputType, PropertyValue};
