use std::fmt::Write;

use serde_json::{json, Value};

use crate::part::Part;
use crate::tree::PartTree;

/// Renders every top-level part and its subtree, two spaces per level.
///
/// ```text
/// Root "Bike" [Assembly]
///   Length = 1.5 (number)
///   ! warning: check frame
///   * Export
///   Root.Frame "Frame" [Frame]
/// ```
#[must_use]
pub fn render_outline(tree: &PartTree) -> String {
    let mut out = String::new();
    for part in top_level(tree) {
        render_part(tree, part, 0, &mut out);
    }
    out
}

/// Outline of one part and its subtree, or `None` when the part is unknown.
#[must_use]
pub fn render_subtree(tree: &PartTree, ref_chain: &str) -> Option<String> {
    let part = tree.get(ref_chain)?;
    let mut out = String::new();
    render_part(tree, part, 0, &mut out);
    Some(out)
}

fn render_part(tree: &PartTree, part: &Part, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{indent}{} {:?} [{}]",
        part.ref_chain(),
        part.name(),
        part.part_type()
    );
    for property in part.properties() {
        let value = property
            .value()
            .map_or_else(|| "null".to_string(), ToString::to_string);
        let _ = writeln!(
            out,
            "{indent}  {} = {value} ({})",
            property.full_name(),
            property.data_type()
        );
    }
    for message in part.messages() {
        let _ = writeln!(out, "{indent}  ! {}: {}", message.severity.as_str(), message.text);
    }
    for action in part.actions() {
        let _ = writeln!(out, "{indent}  * {}", action.name);
    }
    for child in tree.children_of(part) {
        render_part(tree, child, depth + 1, out);
    }
}

/// JSON view of every top-level part and its subtree.
#[must_use]
pub fn tree_to_json(tree: &PartTree) -> Value {
    Value::Array(
        top_level(tree)
            .map(|part| part_to_json(tree, part))
            .collect(),
    )
}

#[must_use]
pub fn subtree_to_json(tree: &PartTree, ref_chain: &str) -> Option<Value> {
    tree.get(ref_chain).map(|part| part_to_json(tree, part))
}

fn part_to_json(tree: &PartTree, part: &Part) -> Value {
    let properties = part
        .properties()
        .iter()
        .map(|property| {
            json!({
                "fullName": property.full_name(),
                "value": property.value(),
                "dataType": property.data_type(),
                "inputType": property.input_type(),
                "tooltip": property.tooltip(),
                "choiceList": property.choice_list(),
                "isReadOnly": property.is_read_only(),
                "updateOn": property.update_trigger(),
            })
        })
        .collect::<Vec<_>>();
    let children = tree
        .children_of(part)
        .map(|child| part_to_json(tree, child))
        .collect::<Vec<_>>();
    json!({
        "refChain": part.ref_chain(),
        "name": part.name(),
        "partType": part.part_type(),
        "properties": properties,
        "messages": part.messages(),
        "actions": part.actions(),
        "children": children,
    })
}

fn top_level(tree: &PartTree) -> impl Iterator<Item = &Part> + '_ {
    tree.all().filter(|part| tree.parent_of(part).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::PartDelta;
    use crate::merge::apply_delta;

    #[test]
    fn json_view_nests_children() {
        let delta = PartDelta::from_value(json!({
            "refChain": "Root",
            "Name": "Bike",
            "properties": [{"name": "Gears", "value": {
                "FullName": "Gears",
                "Value": 21,
                "Tooltip": "{\"ToolTip\":\"Gear count\",\"DataType\":\"Integer\"}"
            }}],
            "children": [{"refChain": "Root.Frame", "Name": "Frame"}]
        }))
        .unwrap();
        let mut tree = PartTree::new();
        apply_delta(&mut tree, &delta);

        let value = tree_to_json(&tree);
        assert_eq!(value[0]["refChain"], "Root");
        assert_eq!(value[0]["properties"][0]["value"], 21);
        assert_eq!(value[0]["properties"][0]["dataType"], "integer");
        assert_eq!(value[0]["properties"][0]["inputType"], "number");
        assert_eq!(value[0]["properties"][0]["updateOn"], "blur");
        assert_eq!(value[0]["children"][0]["name"], "Frame");
        assert_eq!(
            subtree_to_json(&tree, "Root.Frame").unwrap()["partType"],
            ""
        );
        assert!(subtree_to_json(&tree, "Root.Seat").is_none());
    }

    #[test]
    fn subtree_outline_starts_at_the_part() {
        let delta = PartDelta::from_value(json!({
            "refChain": "Root",
            "Name": "Bike",
            "children": [{
                "refChain": "Root.Frame",
                "Name": "Frame",
                "Messages": [{"Text": "check welds", "Severity": "Warning"}],
                "children": [{"refChain": "Root.Frame.Fork", "Name": "Fork"}]
            }]
        }))
        .unwrap();
        let mut tree = PartTree::new();
        apply_delta(&mut tree, &delta);

        assert_eq!(
            render_subtree(&tree, "Root.Frame").unwrap(),
            "Root.Frame \"Frame\" []\n  ! warning: check welds\n  Root.Frame.Fork \"Fork\" []\n"
        );
        assert!(render_subtree(&tree, "Root.Seat").is_none());
    }
}
