//! Engine configuration from CLI flags and the optional policy file.

use anyhow::{Context, bail};
use cmdbsync_core::{CategoryPolicy, ReconcileConfig, Reconciler};

use crate::cli::SnapshotArgs;

/// Load the category policy. A policy file's own prefix wins over
/// `--group-prefix`.
pub fn load_policy(args: &SnapshotArgs) -> anyhow::Result<CategoryPolicy> {
    let Some(path) = &args.policy else {
        let policy = CategoryPolicy::new(args.group_prefix.as_str());
        if policy.group_prefix().is_empty() {
            bail!("--group-prefix must not be empty");
        }
        return Ok(policy);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    let policy = CategoryPolicy::from_json(&json, &args.group_prefix)
        .with_context(|| format!("failed to load policy file {}", path.display()))?;
    tracing::debug!(
        "loaded category policy from {} (prefix {})",
        path.display(),
        policy.group_prefix()
    );
    Ok(policy)
}

pub fn build_reconciler(args: &SnapshotArgs) -> anyhow::Result<Reconciler> {
    let policy = load_policy(args)?;
    let config = ReconcileConfig {
        export_group_id: args.export_group.trim().to_string(),
    };
    Reconciler::new(policy, config).context("invalid engine configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> SnapshotArgs {
        SnapshotArgs {
            cmdb: PathBuf::from("c.json"),
            monitoring: PathBuf::from("m.json"),
            export_group: "1".into(),
            group_prefix: "CMDB".into(),
            policy: None,
        }
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures")
            .join(name)
    }

    #[test]
    fn built_in_policy_uses_prefix() {
        let mut a = args();
        a.group_prefix = "Inventory/".into();
        let policy = load_policy(&a).expect("policy");
        assert_eq!(policy.group_name("Router"), "Inventory/Router");
    }

    #[test]
    fn empty_prefix_rejected() {
        let mut a = args();
        a.group_prefix = "/".into();
        assert!(load_policy(&a).is_err());
    }

    #[test]
    fn policy_file_is_layered_over_defaults() {
        let mut a = args();
        a.policy = Some(fixture("policy.json"));
        let policy = load_policy(&a).expect("policy");
        assert_eq!(policy.group_name("Firewall"), "CMDB/Network Security");
        assert_eq!(policy.group_name("Router"), "CMDB/Router");
    }

    #[test]
    fn missing_policy_file_names_path() {
        let mut a = args();
        a.policy = Some(PathBuf::from("/nonexistent/policy.json"));
        let err = load_policy(&a).expect_err("should fail");
        assert!(format!("{err:#}").contains("/nonexistent/policy.json"));
    }

    #[test]
    fn blank_export_group_rejected() {
        let mut a = args();
        a.export_group = "  ".into();
        assert!(build_reconciler(&a).is_err());
    }
}
