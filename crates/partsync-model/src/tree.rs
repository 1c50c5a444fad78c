//! Arena storage for parts.
//!
//! Parts live in one map keyed by ref chain; parent and child links are keys
//! resolved through the map. Insertion order is kept so that iteration and
//! rendering are deterministic.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::part::{Message, Part};
use crate::property::Property;
use crate::ref_chain::{RefChain, ROOT_REF_CHAIN};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartTree {
    parts: IndexMap<RefChain, Part>,
    root: Option<RefChain>,
}

impl PartTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[must_use]
    pub fn contains(&self, ref_chain: &str) -> bool {
        self.parts.contains_key(ref_chain)
    }

    #[must_use]
    pub fn get(&self, ref_chain: &str) -> Option<&Part> {
        self.parts.get(ref_chain)
    }

    pub(crate) fn get_mut(&mut self, ref_chain: &str) -> Option<&mut Part> {
        self.parts.get_mut(ref_chain)
    }

    /// Inserts or replaces a part, returning the previous entry.
    pub fn upsert(&mut self, part: Part) -> Option<Part> {
        self.parts.insert(part.ref_chain.clone(), part)
    }

    /// Removes one part and severs it from its parent's children.
    ///
    /// The removed part's own children are left in the store. Removing an
    /// unknown ref chain is a no-op.
    pub fn delete(&mut self, ref_chain: &str) -> Option<Part> {
        let removed = self.parts.shift_remove(ref_chain)?;
        if let Some(parent) = removed
            .parent
            .as_ref()
            .and_then(|parent| self.parts.get_mut(parent.as_str()))
        {
            parent.remove_child(&removed.ref_chain);
        }
        if self.root.as_ref() == Some(&removed.ref_chain) {
            self.root = None;
        }
        Some(removed)
    }

    /// Removes a part together with every descendant, returning the removed
    /// ref chains (the named part first).
    pub fn delete_subtree(&mut self, ref_chain: &str) -> Vec<RefChain> {
        let Some(part) = self.parts.get(ref_chain) else {
            return Vec::new();
        };
        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![part.ref_chain.clone()];
        while let Some(next) = stack.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(part) = self.parts.get(next.as_str()) {
                stack.extend(part.children.iter().rev().cloned());
            }
            order.push(next);
        }
        for removed in &order {
            self.delete(removed.as_str());
        }
        order
    }

    /// All parts in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Part> + '_ {
        self.parts.values()
    }

    pub fn ref_chains(&self) -> impl Iterator<Item = &RefChain> + '_ {
        self.parts.keys()
    }

    pub fn clear(&mut self) {
        self.parts.clear();
        self.root = None;
    }

    #[must_use]
    pub fn root(&self) -> Option<&Part> {
        self.root.as_ref().and_then(|root| self.parts.get(root.as_str()))
    }

    /// Re-reads the designated root from the store.
    pub(crate) fn refresh_root(&mut self) {
        self.root = self
            .parts
            .get(ROOT_REF_CHAIN)
            .map(|part| part.ref_chain.clone());
    }

    #[must_use]
    pub fn parent_of(&self, part: &Part) -> Option<&Part> {
        part.parent
            .as_ref()
            .and_then(|parent| self.parts.get(parent.as_str()))
    }

    /// Resolved children of `part`, in order.
    pub fn children_of<'a>(&'a self, part: &'a Part) -> impl Iterator<Item = &'a Part> + 'a {
        part.children
            .iter()
            .filter_map(|child| self.parts.get(child.as_str()))
    }

    /// Links `child` under `parent`, detaching it from any previous parent.
    ///
    /// Returns `false` (and leaves the tree unchanged) when either part is
    /// unknown or the link would make `child` its own ancestor.
    pub fn attach(&mut self, child: &RefChain, parent: &RefChain) -> bool {
        if !self.parts.contains_key(child.as_str()) || !self.parts.contains_key(parent.as_str()) {
            return false;
        }
        if self.is_ancestor_or_self(child, parent) {
            warn!("refusing to link {child} under its own descendant {parent}");
            return false;
        }
        let previous = self
            .parts
            .get_mut(child.as_str())
            .and_then(|part| part.parent.replace(parent.clone()));
        if let Some(previous) = previous.filter(|previous| previous != parent) {
            if let Some(old_parent) = self.parts.get_mut(previous.as_str()) {
                old_parent.remove_child(child);
            }
        }
        if let Some(parent) = self.parts.get_mut(parent.as_str()) {
            parent.push_child(child.clone());
        }
        true
    }

    /// Walks up from `descendant` looking for `ancestor`.
    fn is_ancestor_or_self(&self, ancestor: &RefChain, descendant: &RefChain) -> bool {
        let mut seen = FxHashSet::default();
        let mut current = Some(descendant);
        while let Some(ref_chain) = current {
            if ref_chain == ancestor {
                return true;
            }
            if !seen.insert(ref_chain) {
                return false;
            }
            current = self
                .parts
                .get(ref_chain.as_str())
                .and_then(|part| part.parent.as_ref());
        }
        false
    }

    /// Own messages followed by every descendant's, depth first with
    /// children in order. Computed on each call.
    #[must_use]
    pub fn all_messages(&self, ref_chain: &str) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(part) = self.parts.get(ref_chain) {
            self.collect_messages(part, &mut messages);
        }
        messages
    }

    fn collect_messages(&self, part: &Part, out: &mut Vec<Message>) {
        out.extend(part.messages.iter().cloned());
        for child in self.children_of(part) {
            self.collect_messages(child, out);
        }
    }

    /// Property reached through a part's shortcut map.
    #[must_use]
    pub fn shortcut_property(&self, ref_chain: &str, name: &str) -> Option<&Property> {
        self.parts.get(ref_chain)?.shortcut_property(name)
    }

    /// Child reached through a part's sanitised child-name shortcut.
    #[must_use]
    pub fn shortcut_child(&self, ref_chain: &str, name: &str) -> Option<&Part> {
        let child = self.parts.get(ref_chain)?.shortcuts.children.get(name)?;
        self.parts.get(child.as_str())
    }

    /// Children of the collection part registered on `ref_chain` under `name`.
    #[must_use]
    pub fn collection(&self, ref_chain: &str, name: &str) -> Option<Vec<&Part>> {
        let collection = self.parts.get(ref_chain)?.shortcuts.collections.get(name)?;
        let collection = self.parts.get(collection.as_str())?;
        Some(self.children_of(collection).collect())
    }
}
