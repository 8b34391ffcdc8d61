//! Snapshot loading shared by every command.

use anyhow::Context;
use cmdbsync_core::ReconcileInput;
use cmdbsync_snapshot::{CmdbSnapshot, MonitoringSnapshot, load_cmdb, load_monitoring};

use crate::cli::SnapshotArgs;

/// Both sides of one pass, fully materialized.
pub struct Snapshots {
    pub cmdb: CmdbSnapshot,
    pub monitoring: MonitoringSnapshot,
}

impl Snapshots {
    pub fn load(args: &SnapshotArgs) -> anyhow::Result<Self> {
        let cmdb = load_cmdb(&args.cmdb).context("failed to load CMDB snapshot")?;
        let monitoring =
            load_monitoring(&args.monitoring).context("failed to load monitoring snapshot")?;
        tracing::info!(
            "loaded {} CMDB records, {} monitoring hosts",
            cmdb.records.len(),
            monitoring.hosts.len()
        );
        Ok(Self { cmdb, monitoring })
    }

    pub fn input(&self) -> ReconcileInput<'_> {
        ReconcileInput {
            records: &self.cmdb.records,
            hosts: &self.monitoring.hosts,
            groups: &self.monitoring.groups,
            templates: &self.monitoring.templates,
            proxies: &self.monitoring.proxies,
            locations: &self.cmdb.locations,
        }
    }
}
