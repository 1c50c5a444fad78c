//! Pluggable naming policy for shortcut projection.

use crate::part::Part;
use crate::tree::PartTree;

/// Characters that may not appear in a shortcut identifier.
const INVALID_IDENTIFIER_CHARS: &[char] = &['%', '/', '?', ')', '(', '.', '\''];

/// Replaces whitespace and `% / ? ) ( . '` with `replacement`.
#[must_use]
pub fn sanitize_identifier(name: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_whitespace() || INVALID_IDENTIFIER_CHARS.contains(&ch) {
            out.push_str(replacement);
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decides identifier sanitisation and collection naming, and gets a look at
/// every part once the builtin shortcuts exist.
pub trait NamingStrategy: Send + Sync {
    /// Text substituted for each invalid identifier character.
    fn invalid_character_replacement(&self) -> &str {
        ""
    }

    /// Whether `part` groups a list of siblings that deserve a shortcut on
    /// its parent.
    fn is_part_collection(&self, part: &Part) -> bool;

    /// Name of the collection shortcut installed on the parent.
    fn parse_collection_name(&self, part_name: &str) -> String;

    /// Extension hook, called for every part after projection.
    fn visit_part(&self, _part: &Part, _tree: &PartTree) {}

    fn sanitize(&self, name: &str) -> String {
        sanitize_identifier(name, self.invalid_character_replacement())
    }
}

/// Treats parts named `...Collection` as collections and pluralises the
/// remaining stem.
#[derive(Debug, Clone, Default)]
pub struct DefaultNamingStrategy {
    replacement: String,
}

impl DefaultNamingStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_replacement(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
        }
    }
}

impl NamingStrategy for DefaultNamingStrategy {
    fn invalid_character_replacement(&self) -> &str {
        &self.replacement
    }

    fn is_part_collection(&self, part: &Part) -> bool {
        part.name().ends_with("Collection")
    }

    fn parse_collection_name(&self, part_name: &str) -> String {
        let single = part_name.replacen("Collection", "", 1);
        match single.strip_suffix('y') {
            Some(stem) => format!("{stem}ies"),
            None => format!("{single}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ref_chain::RefChain;

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_identifier("Frame Size (cm)", ""), "FrameSizecm");
        assert_eq!(sanitize_identifier("a.b/c?d%e'f", "_"), "a_b_c_d_e_f");
        assert_eq!(sanitize_identifier("Tab\there", "-"), "Tab-here");
        assert_eq!(sanitize_identifier("Plain", "_"), "Plain");
    }

    #[test]
    fn default_strategy_pluralises_collections() {
        let naming = DefaultNamingStrategy::new();
        assert_eq!(naming.parse_collection_name("WheelCollection"), "Wheels");
        assert_eq!(naming.parse_collection_name("AccessoryCollection"), "Accessories");
        assert_eq!(naming.parse_collection_name("Collection"), "s");
    }

    #[test]
    fn default_strategy_detects_collection_parts() {
        let naming = DefaultNamingStrategy::with_replacement("_");
        let collection = Part::new(RefChain::new("Root.Wheels")).with_name("WheelCollection", "");
        let single = Part::new(RefChain::new("Root.Wheel")).with_name("Wheel", "");
        assert!(naming.is_part_collection(&collection));
        assert!(!naming.is_part_collection(&single));
        assert_eq!(naming.sanitize("Front Wheel"), "Front_Wheel");
    }
}
