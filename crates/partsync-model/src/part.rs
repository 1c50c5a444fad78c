use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::property::Property;
use crate::ref_chain::RefChain;

/// Severity of a part message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "error", alias = "ERROR")]
    Error,
    #[serde(alias = "warning", alias = "WARNING")]
    Warning,
    #[default]
    #[serde(alias = "info", alias = "INFO", alias = "Information")]
    Info,
    #[serde(other)]
    Other,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Other => "other",
        }
    }
}

/// Message attached to a part by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Message {
    #[serde(alias = "text")]
    pub text: String,
    #[serde(alias = "severity")]
    pub severity: Severity,
}

impl Message {
    #[must_use]
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }
}

/// Command the viewer exposes on a part.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Action {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "category")]
    pub category: Option<String>,
    #[serde(alias = "menuText")]
    pub menu_text: Option<String>,
    #[serde(alias = "tooltip")]
    pub tooltip: Option<String>,
}

/// Callable shortcut for one action: the target part and action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub ref_chain: RefChain,
    pub name: String,
}

/// Named lookups rebuilt by every projection sweep.
///
/// Keys are sanitised identifiers; values point back into canonical state
/// (property full names, child and collection ref chains).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shortcuts {
    pub properties: IndexMap<SmolStr, SmolStr>,
    pub children: IndexMap<SmolStr, RefChain>,
    pub collections: IndexMap<SmolStr, RefChain>,
    pub actions: IndexMap<SmolStr, ActionBinding>,
}

impl Shortcuts {
    pub fn clear(&mut self) {
        self.properties.clear();
        self.children.clear();
        self.collections.clear();
        self.actions.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.children.is_empty()
            && self.collections.is_empty()
            && self.actions.is_empty()
    }
}

/// A node of the mirrored model tree.
///
/// Parent and children are ref chains resolved through the owning
/// [`PartTree`](crate::PartTree); a part never owns another part directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub(crate) ref_chain: RefChain,
    pub(crate) name: String,
    pub(crate) part_type: String,
    pub(crate) properties: Vec<Property>,
    pub(crate) actions: Vec<Action>,
    pub(crate) messages: Vec<Message>,
    pub(crate) parent: Option<RefChain>,
    pub(crate) children: Vec<RefChain>,
    pub(crate) shortcuts: Shortcuts,
}

impl Part {
    #[must_use]
    pub fn new(ref_chain: RefChain) -> Self {
        Self {
            ref_chain,
            name: String::new(),
            part_type: String::new(),
            properties: Vec::new(),
            actions: Vec::new(),
            messages: Vec::new(),
            parent: None,
            children: Vec::new(),
            shortcuts: Shortcuts::default(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>, part_type: impl Into<String>) -> Self {
        self.name = name.into();
        self.part_type = part_type.into();
        self
    }

    #[must_use]
    pub fn ref_chain(&self) -> &RefChain {
        &self.ref_chain
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn part_type(&self) -> &str {
        &self.part_type
    }

    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, full_name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.full_name() == full_name)
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn parent(&self) -> Option<&RefChain> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[RefChain] {
        &self.children
    }

    #[must_use]
    pub fn has_child(&self, ref_chain: &RefChain) -> bool {
        self.children.contains(ref_chain)
    }

    #[must_use]
    pub fn shortcuts(&self) -> &Shortcuts {
        &self.shortcuts
    }

    /// Property addressed by its sanitised shortcut name.
    #[must_use]
    pub fn shortcut_property(&self, name: &str) -> Option<&Property> {
        let full_name = self.shortcuts.properties.get(name)?;
        self.property(full_name)
    }

    #[must_use]
    pub fn action_binding(&self, name: &str) -> Option<&ActionBinding> {
        self.shortcuts.actions.get(name)
    }

    pub(crate) fn remove_child(&mut self, ref_chain: &RefChain) {
        self.children.retain(|child| child != ref_chain);
    }

    pub(crate) fn push_child(&mut self, ref_chain: RefChain) {
        if !self.children.contains(&ref_chain) {
            self.children.push(ref_chain);
        }
    }

    pub(crate) fn remove_property(&mut self, full_name: &str) {
        if let Some(index) = self
            .properties
            .iter()
            .position(|property| property.full_name() == full_name)
        {
            self.properties.remove(index);
        }
    }
}
