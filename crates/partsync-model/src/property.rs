use serde::Serialize;
use serde_json::Value;
use smol_str::SmolStr;

use crate::ref_chain::RefChain;
use crate::value::{DataType, InputType, PropertyValue};

/// One entry of a property's choice list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceItem {
    pub value: PropertyValue,
    pub text: String,
}

/// When an edit control should commit its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateTrigger {
    /// Commit on every change (checkboxes, pick lists).
    Default,
    /// Commit when the control loses focus.
    Blur,
}

/// An attribute of a part, rebuilt from scratch on every merge that touches
/// the owning part.
///
/// Values are read-only here; writes go through the synchronization context
/// so that the authoritative value always arrives with the viewer's next
/// delta.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub(crate) part: RefChain,
    pub(crate) full_name: SmolStr,
    pub(crate) ui_rule_name: SmolStr,
    pub(crate) category: Option<String>,
    pub(crate) value: Option<PropertyValue>,
    pub(crate) data_type: DataType,
    pub(crate) tooltip: Option<String>,
    pub(crate) custom_data: Option<Value>,
    pub(crate) choice_list: Option<Vec<ChoiceItem>>,
    pub(crate) choice_list_display_mode: Option<i64>,
    pub(crate) sequence: Option<i32>,
    pub(crate) precision: Option<i32>,
    pub(crate) is_read_only: bool,
    pub(crate) is_locked: bool,
    pub(crate) is_modified: bool,
    pub(crate) restrict_to_list: bool,
    pub(crate) inv_param_name: Option<String>,
    pub(crate) error_info: Option<Value>,
}

impl Property {
    /// Ref chain of the hosting part.
    #[must_use]
    pub fn part(&self) -> &RefChain {
        &self.part
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Server-side name used when writing this property back.
    #[must_use]
    pub fn ui_rule_name(&self) -> &str {
        &self.ui_rule_name
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    #[must_use]
    pub fn custom_data(&self) -> Option<&Value> {
        self.custom_data.as_ref()
    }

    #[must_use]
    pub fn choice_list(&self) -> Option<&[ChoiceItem]> {
        self.choice_list.as_deref()
    }

    #[must_use]
    pub fn choice_list_display_mode(&self) -> Option<i64> {
        self.choice_list_display_mode
    }

    #[must_use]
    pub fn sequence(&self) -> Option<i32> {
        self.sequence
    }

    #[must_use]
    pub fn precision(&self) -> Option<i32> {
        self.precision
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    #[must_use]
    pub fn restrict_to_list(&self) -> bool {
        self.restrict_to_list
    }

    #[must_use]
    pub fn inv_param_name(&self) -> Option<&str> {
        self.inv_param_name.as_deref()
    }

    #[must_use]
    pub fn error_info(&self) -> Option<&Value> {
        self.error_info.as_ref()
    }

    #[must_use]
    pub fn input_type(&self) -> InputType {
        self.data_type.input_type()
    }

    #[must_use]
    pub fn is_checkbox(&self) -> bool {
        self.data_type == DataType::Boolean
    }

    #[must_use]
    pub fn has_choice_list(&self) -> bool {
        self.choice_list.as_ref().is_some_and(|list| !list.is_empty())
    }

    #[must_use]
    pub fn update_trigger(&self) -> UpdateTrigger {
        if self.is_checkbox() || self.has_choice_list() {
            UpdateTrigger::Default
        } else {
            UpdateTrigger::Blur
        }
    }
}
