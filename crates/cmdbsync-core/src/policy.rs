//! Category policy table: CMDB category → {interface type, group name}.
//!
//! Adding a category is a data change: callers may load overrides from JSON
//! with [`CategoryPolicy::from_json`]. Categories are looked up after
//! sanitizing, so override keys are sanitized the same way.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EngineError;
use crate::normalize::sanitize;
use crate::types::{Group, InterfaceType};

/// Default prefix for category groups (`CMDB/<category>`).
pub const DEFAULT_GROUP_PREFIX: &str = "CMDB";

/// Categories monitored through an agent out of the box.
pub const AGENT_CATEGORIES: [&str; 2] = ["Linux Server", "Windows Server"];

/// Resolved rule for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub interface_type: InterfaceType,
    pub group_name: String,
}

/// Per-category deviation from the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryOverride {
    pub interface_type: Option<InterfaceType>,
    pub group_name: Option<String>,
}

/// On-disk shape of a policy file. Interface types are written by name.
#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    group_prefix: Option<String>,
    #[serde(default)]
    default_interface: Option<String>,
    #[serde(default)]
    categories: HashMap<String, RawOverride>,
}

#[derive(Debug, Deserialize)]
struct RawOverride {
    #[serde(default)]
    interface_type: Option<String>,
    #[serde(default)]
    group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPolicy {
    group_prefix: String,
    default_interface: InterfaceType,
    overrides: HashMap<String, CategoryOverride>,
}

impl CategoryPolicy {
    /// Built-in table: Linux/Windows servers are agent-monitored, everything
    /// else is SNMP.
    pub fn new(group_prefix: impl Into<String>) -> Self {
        let overrides = AGENT_CATEGORIES
            .iter()
            .map(|c| {
                (
                    (*c).to_string(),
                    CategoryOverride {
                        interface_type: Some(InterfaceType::Agent),
                        group_name: None,
                    },
                )
            })
            .collect();
        Self {
            group_prefix: group_prefix.into().trim_end_matches('/').to_string(),
            default_interface: InterfaceType::Snmp,
            overrides,
        }
    }

    /// Parse a policy document and layer it over the built-in table.
    ///
    /// `fallback_prefix` applies when the document does not name one.
    pub fn from_json(json: &str, fallback_prefix: &str) -> Result<Self, EngineError> {
        let doc: PolicyDocument =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidPolicy(e.to_string()))?;

        let prefix = doc.group_prefix.as_deref().unwrap_or(fallback_prefix);
        let mut policy = Self::new(prefix);
        if policy.group_prefix.is_empty() {
            return Err(EngineError::InvalidPolicy(
                "group prefix must not be empty".into(),
            ));
        }

        if let Some(raw) = doc.default_interface {
            policy.default_interface = raw
                .parse()
                .map_err(|e: EngineError| EngineError::InvalidPolicy(e.to_string()))?;
        }

        for (category, raw) in doc.categories {
            let interface_type = raw
                .interface_type
                .map(|s| s.parse::<InterfaceType>())
                .transpose()
                .map_err(|e| EngineError::InvalidPolicy(format!("{category}: {e}")))?;
            let entry = policy.overrides.entry(sanitize(&category)).or_default();
            if interface_type.is_some() {
                entry.interface_type = interface_type;
            }
            if raw.group_name.is_some() {
                entry.group_name = raw.group_name;
            }
        }
        Ok(policy)
    }

    /// Replace the rule for one category. `category` is sanitized first.
    pub fn set_override(&mut self, category: &str, rule: CategoryOverride) {
        self.overrides.insert(sanitize(category), rule);
    }

    pub fn group_prefix(&self) -> &str {
        &self.group_prefix
    }

    pub fn rule_for(&self, category: &str) -> CategoryRule {
        CategoryRule {
            interface_type: self.interface_type(category),
            group_name: self.group_name(category),
        }
    }

    pub fn interface_type(&self, category: &str) -> InterfaceType {
        self.overrides
            .get(category)
            .and_then(|o| o.interface_type)
            .unwrap_or(self.default_interface)
    }

    pub fn group_name(&self, category: &str) -> String {
        match self.overrides.get(category).and_then(|o| o.group_name.as_ref()) {
            Some(name) => name.clone(),
            None => format!("{}/{category}", self.group_prefix),
        }
    }

    /// Whether a group is one of the category groups this policy manages.
    pub fn is_category_group(&self, group: &Group) -> bool {
        group
            .name
            .strip_prefix(&self.group_prefix)
            .is_some_and(|rest| rest.starts_with('/'))
            || self
                .overrides
                .values()
                .any(|o| o.group_name.as_deref() == Some(group.name.as_str()))
    }
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_PREFIX)
    }
}
