//! Wire shapes of model data as the viewer emits it.
//!
//! The viewer mixes camelCase envelope keys (`refChain`, `children`) with
//! PascalCase vendor keys (`Name`, `PartType`, `Messages`). Fields are
//! optional wherever the viewer is known to omit them.

use serde::Deserialize;
use serde_json::Value;

use crate::part::{Action, Message};

/// One node of an incremental update, plus the removal list on the root
/// payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartDelta {
    #[serde(rename = "refChain")]
    pub ref_chain: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "PartType", default)]
    pub part_type: String,
    #[serde(rename = "parentRefChain", default)]
    pub parent_ref_chain: Option<String>,
    #[serde(rename = "isCompleteChangedPart", default)]
    pub is_complete_changed_part: bool,
    #[serde(default)]
    pub properties: Option<Vec<RawPropertyEntry>>,
    #[serde(rename = "Messages", default)]
    pub messages: Option<Vec<Message>>,
    #[serde(rename = "Actions", default)]
    pub actions: Option<Vec<Action>>,
    #[serde(default)]
    pub children: Option<Vec<PartDelta>>,
    #[serde(rename = "removedRefChains", default)]
    pub removed_ref_chains: Option<Vec<String>>,
}

impl PartDelta {
    /// Parses a delta from arbitrary model data.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Number of nodes in this delta, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(PartDelta::node_count)
            .sum::<usize>()
    }
}

/// A property as listed on a delta node: the write name plus the vendor record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPropertyEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: RawProperty,
}

/// Vendor property record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawProperty {
    pub full_name: String,
    pub value: Value,
    pub tooltip: Option<String>,
    pub choice_list: Option<Vec<RawChoice>>,
    pub choice_list_display_mode: Option<i64>,
    pub category: Option<String>,
    pub sequence: Option<f64>,
    pub precision: Option<f64>,
    pub is_read_only: bool,
    pub is_locked: bool,
    pub is_modified: bool,
    pub restrict_to_list: bool,
    pub ui_rule_name: Option<String>,
    pub inv_param_name: Option<String>,
    pub error_info: Option<Value>,
}

/// Vendor choice-list entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawChoice {
    pub display_string: Option<String>,
}
