//! Shortcut projection.
//!
//! Runs after a whole batch has merged. Sweep 1 rebuilds every part's
//! shortcut maps from canonical state; sweep 2 hands each part to the naming
//! strategy's `visit_part` hook once all shortcuts exist.

use smol_str::SmolStr;
use tracing::debug;

use crate::naming::NamingStrategy;
use crate::part::{ActionBinding, Shortcuts};
use crate::ref_chain::RefChain;
use crate::tree::PartTree;

/// Rebuilds the shortcut maps of every part in `tree` and refreshes the root.
pub fn project(tree: &mut PartTree, naming: &dyn NamingStrategy) {
    tree.refresh_root();

    let ref_chains = tree.ref_chains().cloned().collect::<Vec<_>>();
    let mut collections: Vec<(RefChain, SmolStr, RefChain)> = Vec::new();
    let mut rebuilt = Vec::with_capacity(ref_chains.len());

    for ref_chain in &ref_chains {
        let Some(part) = tree.get(ref_chain.as_str()) else {
            continue;
        };
        let mut shortcuts = Shortcuts::default();
        for property in part.properties() {
            shortcuts.properties.insert(
                SmolStr::new(naming.sanitize(property.full_name())),
                SmolStr::new(property.full_name()),
            );
        }
        for child in tree.children_of(part) {
            shortcuts
                .children
                .insert(SmolStr::new(naming.sanitize(child.name())), child.ref_chain().clone());
        }
        for action in part.actions() {
            shortcuts.actions.insert(
                SmolStr::new(&action.name),
                ActionBinding {
                    ref_chain: ref_chain.clone(),
                    name: action.name.clone(),
                },
            );
        }
        if naming.is_part_collection(part) {
            if let Some(parent) = part.parent() {
                collections.push((
                    parent.clone(),
                    SmolStr::new(naming.parse_collection_name(part.name())),
                    ref_chain.clone(),
                ));
            }
        }
        rebuilt.push((ref_chain, shortcuts));
    }

    for (ref_chain, shortcuts) in rebuilt {
        if let Some(part) = tree.get_mut(ref_chain.as_str()) {
            part.shortcuts = shortcuts;
        }
    }
    for (parent, name, collection) in collections {
        if let Some(part) = tree.get_mut(parent.as_str()) {
            part.shortcuts.collections.insert(name, collection);
        }
    }
    debug!("projected shortcuts for {} parts", ref_chains.len());

    let tree: &PartTree = tree;
    for part in tree.all() {
        naming.visit_part(part, tree);
    }
}
