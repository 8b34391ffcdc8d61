//! Error and diagnostic types for the reconciliation engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which reference index a lookup went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Template,
    Proxy,
    Location,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Proxy => "proxy",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record failure. The record is skipped; the pass continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileError {
    #[error("{reference} reference `{key}` not found")]
    ReferenceNotFound { reference: ReferenceKind, key: String },

    #[error("host group `{name}` does not exist")]
    MissingGroup { name: String },
}

/// Input anomaly worth surfacing that does not block any record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    #[error("alias `{alias}` is shared by hosts {host_ids:?}; using {}", .host_ids.first().map_or("none", String::as_str))]
    DuplicateAlias { alias: String, host_ids: Vec<String> },

    #[error("source id `{source_id}` appears more than once in the CMDB export")]
    DuplicateSourceId { source_id: String },

    #[error("category `{category}` has no group `{group_name}` yet")]
    UnmappedCategory { category: String, group_name: String },
}

/// Caller contract violation. Fails the whole call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid reconcile config: {0}")]
    InvalidConfig(String),

    #[error("invalid category policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_not_found_names_kind_and_key() {
        let err = ReconcileError::ReferenceNotFound {
            reference: ReferenceKind::Template,
            key: "T9".into(),
        };
        assert_eq!(err.to_string(), "template reference `T9` not found");
    }

    #[test]
    fn duplicate_alias_names_chosen_host() {
        let warn = DataQualityWarning::DuplicateAlias {
            alias: "abc1".into(),
            host_ids: vec!["10".into(), "11".into()],
        };
        let msg = warn.to_string();
        assert!(msg.contains("abc1"));
        assert!(msg.ends_with("using 10"));
    }

    #[test]
    fn reconcile_error_serializes_tagged() {
        let err = ReconcileError::MissingGroup {
            name: "CMDB/Router".into(),
        };
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["kind"], "missing_group");
        assert_eq!(json["name"], "CMDB/Router");
    }
}
