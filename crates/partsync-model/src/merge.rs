//! Incremental merge of viewer deltas into a [`PartTree`].
//!
//! A delta is a (possibly partial) subtree plus a list of ref chains to
//! drop. Removals run first, then the subtree is merged depth first. The
//! merge never fails: every node either creates a part or updates the one
//! already registered under its ref chain.

use tracing::debug;

use crate::delta::PartDelta;
use crate::metadata::parse_property;
use crate::part::Part;
use crate::ref_chain::RefChain;
use crate::tree::PartTree;

/// What a merge pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: Vec<RefChain>,
    pub updated: Vec<RefChain>,
    pub removed: Vec<RefChain>,
}

impl MergeReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Applies one delta to `tree` and returns the ref chain of the merged
/// top-level part alongside the report.
///
/// Shortcut maps of touched parts are cleared; run
/// [`project`](crate::project) afterwards to rebuild them for the whole tree.
pub fn apply_delta(tree: &mut PartTree, delta: &PartDelta) -> (RefChain, MergeReport) {
    let mut report = MergeReport::default();
    for removed in delta.removed_ref_chains.iter().flatten() {
        report.removed.extend(tree.delete_subtree(removed));
    }
    let parent = delta.parent_ref_chain.as_deref().map(RefChain::new);
    let merged = merge_part(tree, delta, parent.as_ref(), &mut report);
    debug!(
        "merged {}: {} inserted, {} updated, {} removed",
        merged,
        report.inserted.len(),
        report.updated.len(),
        report.removed.len()
    );
    (merged, report)
}

fn merge_part(
    tree: &mut PartTree,
    raw: &PartDelta,
    parent: Option<&RefChain>,
    report: &mut MergeReport,
) -> RefChain {
    let ref_chain = RefChain::new(&raw.ref_chain);
    let created = if let Some(part) = tree.get_mut(ref_chain.as_str()) {
        part.shortcuts.clear();
        false
    } else {
        tree.upsert(Part::new(ref_chain.clone()));
        true
    };
    if created {
        report.inserted.push(ref_chain.clone());
    } else {
        report.updated.push(ref_chain.clone());
    }

    if let Some(part) = tree.get_mut(ref_chain.as_str()) {
        part.name.clone_from(&raw.name);
        part.part_type.clone_from(&raw.part_type);

        let replace = created || raw.is_complete_changed_part;
        if replace {
            part.properties.clear();
        }
        for entry in raw.properties.iter().flatten() {
            // last write wins, even within one delta
            let property = parse_property(entry, &ref_chain);
            part.remove_property(property.full_name());
            part.properties.push(property);
        }

        part.messages = raw.messages.clone().unwrap_or_default();
        part.actions = raw.actions.clone().unwrap_or_default();
    }

    if let Some(parent) = parent {
        tree.attach(&ref_chain, parent);
    }

    for child in raw.children.iter().flatten() {
        let child_ref = merge_part(tree, child, Some(&ref_chain), report);
        // a refused (cyclic) link leaves the child where it was
        let linked = tree
            .get(child_ref.as_str())
            .is_some_and(|child| child.parent() == Some(&ref_chain));
        if let Some(part) = tree.get_mut(ref_chain.as_str()).filter(|_| linked) {
            part.push_child(child_ref);
        }
    }

    ref_chain
}
