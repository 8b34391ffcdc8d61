//! CMDB field values.
//!
//! The CMDB table API returns each column either as a bare value or, when
//! display values are requested, as `{ "value", "display_value" }`. Numbers
//! show up for coordinates in some exports.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Text(String),
    Number(serde_json::Number),
    Pair {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        display_value: Option<String>,
    },
}

impl Field {
    /// The stored value, trimmed. Empty when unset.
    pub fn value(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
            Self::Pair { value, .. } => value.as_deref().unwrap_or_default().trim().to_string(),
        }
    }

    /// The stored value exactly as the CMDB holds it. Host keys derive from
    /// the untrimmed name, so names go through here.
    pub fn raw(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Pair { value, .. } => value.clone().unwrap_or_default(),
        }
    }

    /// The displayed value, falling back to the stored one.
    pub fn display(&self) -> String {
        match self {
            Self::Pair {
                display_value: Some(shown),
                ..
            } => shown.trim().to_string(),
            _ => self.value(),
        }
    }
}

/// Stored value of an optional field; empty when absent or null.
pub fn value_of(field: Option<&Field>) -> String {
    field.map(Field::value).unwrap_or_default()
}

/// Untrimmed stored value of an optional field; empty when absent or null.
pub fn raw_of(field: Option<&Field>) -> String {
    field.map(Field::raw).unwrap_or_default()
}

/// Displayed value of an optional field; empty when absent or null.
pub fn display_of(field: Option<&Field>) -> String {
    field.map(Field::display).unwrap_or_default()
}

/// Stored value, `None` when empty.
pub fn non_empty(field: Option<&Field>) -> Option<String> {
    Some(value_of(field)).filter(|v| !v.is_empty())
}
