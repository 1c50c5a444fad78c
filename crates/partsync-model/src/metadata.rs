//! Property metadata recovery.
//! - parse_property: vendor record -> typed `Property`
//! - tooltip documents carry `{ToolTip, DataType, CustomData}` as JSON text
//! - anything unparsable falls back to value-based inference

use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use tracing::trace;

use crate::delta::{RawChoice, RawPropertyEntry};
use crate::property::{ChoiceItem, Property};
use crate::ref_chain::RefChain;
use crate::value::{DataType, PropertyValue};

#[derive(Debug, Deserialize)]
struct TooltipDocument {
    #[serde(rename = "ToolTip", default)]
    tool_tip: Option<String>,
    #[serde(rename = "DataType", default)]
    data_type: Option<String>,
    #[serde(rename = "CustomData", default)]
    custom_data: Option<Value>,
}

/// Metadata recovered from a property's tooltip and value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMetadata {
    pub data_type: DataType,
    pub tooltip: Option<String>,
    pub custom_data: Option<Value>,
}

/// Reads the structured tooltip, falling back to value-based inference.
///
/// A tooltip that is not a metadata document is kept verbatim as plain text.
/// A document without a recognisable `DataType` still contributes its text
/// and custom data.
#[must_use]
pub fn parse_metadata(tooltip: Option<&str>, value: &Value) -> PropertyMetadata {
    let document = tooltip.and_then(|text| match serde_json::from_str::<TooltipDocument>(text) {
        Ok(document) => Some(document),
        Err(err) => {
            trace!("tooltip is not a metadata document: {err}");
            None
        }
    });
    let Some(document) = document else {
        return PropertyMetadata {
            data_type: DataType::infer(value),
            tooltip: tooltip.map(str::to_string),
            custom_data: None,
        };
    };
    let data_type = document
        .data_type
        .as_deref()
        .and_then(|name| name.parse::<DataType>().ok())
        .unwrap_or_else(|| {
            trace!(
                "metadata data type {:?} not recognised, inferring from value",
                document.data_type
            );
            DataType::infer(value)
        });
    PropertyMetadata {
        data_type,
        tooltip: document.tool_tip,
        custom_data: document.custom_data.filter(|data| !data.is_null()),
    }
}

/// Converts vendor choice entries into `{value, text}` pairs.
#[must_use]
pub fn parse_choice_list(choices: &[RawChoice], data_type: DataType) -> Vec<ChoiceItem> {
    choices
        .iter()
        .filter_map(|choice| choice.display_string.as_deref())
        .map(|text| ChoiceItem {
            value: PropertyValue::from_display(text, data_type),
            text: text.to_string(),
        })
        .collect()
}

/// Builds a fresh [`Property`] for the part identified by `part`.
#[must_use]
pub fn parse_property(entry: &RawPropertyEntry, part: &RefChain) -> Property {
    let raw = &entry.value;
    let metadata = parse_metadata(raw.tooltip.as_deref(), &raw.value);
    let full_name = if raw.full_name.is_empty() {
        SmolStr::new(&entry.name)
    } else {
        SmolStr::new(&raw.full_name)
    };
    let ui_rule_name = raw
        .ui_rule_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map_or_else(|| SmolStr::new(&entry.name), SmolStr::new);
    Property {
        part: part.clone(),
        full_name,
        ui_rule_name,
        category: raw.category.clone(),
        value: PropertyValue::coerce(&raw.value, metadata.data_type),
        data_type: metadata.data_type,
        tooltip: metadata.tooltip,
        custom_data: metadata.custom_data,
        choice_list: raw
            .choice_list
            .as_deref()
            .map(|choices| parse_choice_list(choices, metadata.data_type)),
        choice_list_display_mode: raw.choice_list_display_mode,
        sequence: raw.sequence.map(saturate),
        precision: raw.precision.map(saturate),
        is_read_only: raw.is_read_only,
        is_locked: raw.is_locked,
        is_modified: raw.is_modified,
        restrict_to_list: raw.restrict_to_list,
        inv_param_name: raw.inv_param_name.clone(),
        error_info: raw.error_info.clone().filter(|info| !info.is_null()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn saturate(number: f64) -> i32 {
    number as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::InputType;
    use serde_json::json;

    fn entry(value: Value) -> RawPropertyEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn structured_tooltip_sets_type_and_text() {
        let property = parse_property(
            &entry(json!({
                "name": "Length",
                "value": {
                    "FullName": "Length",
                    "Value": 3.5,
                    "Tooltip": r#"{"ToolTip":"Length","DataType":"Number","CustomData":null}"#
                }
            })),
            &RefChain::root(),
        );
        assert_eq!(property.data_type(), DataType::Number);
        assert_eq!(property.input_type(), InputType::Number);
        assert_eq!(property.tooltip(), Some("Length"));
        assert_eq!(property.custom_data(), None);
        assert_eq!(property.value(), Some(&PropertyValue::Number(3.5)));
    }

    #[test]
    fn unparsable_tooltip_falls_back_to_value_inference() {
        let property = parse_property(
            &entry(json!({
                "name": "Width",
                "value": {"FullName": "Width", "Value": 3.5, "Tooltip": "{not json"}
            })),
            &RefChain::root(),
        );
        assert_eq!(property.data_type(), DataType::Number);
        assert_eq!(property.tooltip(), Some("{not json"));
    }

    #[test]
    fn missing_tooltip_infers_boolean_and_date() {
        let flag = parse_metadata(None, &json!(true));
        assert_eq!(flag.data_type, DataType::Boolean);
        assert_eq!(flag.tooltip, None);

        let date = parse_metadata(None, &json!("2023-11-05"));
        assert_eq!(date.data_type, DataType::Date);

        let text = parse_metadata(Some("Plain help text"), &json!("Steel"));
        assert_eq!(text.data_type, DataType::String);
        assert_eq!(text.tooltip.as_deref(), Some("Plain help text"));
    }

    #[test]
    fn document_without_data_type_keeps_text_and_custom_data() {
        let metadata = parse_metadata(
            Some(r#"{"ToolTip":"Count","CustomData":{"unit":"pcs"}}"#),
            &json!(4),
        );
        assert_eq!(metadata.data_type, DataType::Number);
        assert_eq!(metadata.tooltip.as_deref(), Some("Count"));
        assert_eq!(metadata.custom_data, Some(json!({"unit": "pcs"})));
    }

    #[test]
    fn choice_list_converts_by_data_type() {
        let property = parse_property(
            &entry(json!({
                "name": "Enabled",
                "value": {
                    "FullName": "Enabled",
                    "Value": "False",
                    "Tooltip": r#"{"ToolTip":"Enabled","DataType":"Boolean","CustomData":null}"#,
                    "ChoiceList": [{"DisplayString": "True"}, {"DisplayString": "False"}]
                }
            })),
            &RefChain::root(),
        );
        assert!(property.is_checkbox());
        assert!(property.has_choice_list());
        assert_eq!(property.value(), Some(&PropertyValue::Boolean(false)));
        let choices = property.choice_list().unwrap();
        assert_eq!(choices[0].value, PropertyValue::Boolean(true));
        assert_eq!(choices[0].text, "True");
        assert_eq!(choices[1].value, PropertyValue::Boolean(false));
    }

    #[test]
    fn rule_name_falls_back_to_entry_name() {
        let named = parse_property(
            &entry(json!({
                "name": "Frame Size",
                "value": {"FullName": "Frame Size", "Value": 54, "UiRuleName": "frameSize"}
            })),
            &RefChain::new("Root.Frame"),
        );
        assert_eq!(named.ui_rule_name(), "frameSize");
        assert_eq!(named.part(), &RefChain::new("Root.Frame"));

        let unnamed = parse_property(
            &entry(json!({"name": "Color", "value": {"FullName": "Color", "Value": "Red"}})),
            &RefChain::root(),
        );
        assert_eq!(unnamed.ui_rule_name(), "Color");
    }
}
