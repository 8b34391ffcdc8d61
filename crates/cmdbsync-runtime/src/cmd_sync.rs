//! `cmdbsync sync`: lock, create missing groups, reconcile, apply.

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, bail};
use cmdbsync_core::{ReconcilePlan, Reconciler};
use cmdbsync_snapshot::{Applier, ApplySummary, DryRunApi, JsonLinesApi, MonitoringApi};

use crate::cli::{SyncOpts, default_lock_path};
use crate::config::build_reconciler;
use crate::context::Snapshots;
use crate::lock::try_lock;

pub fn cmd_sync(opts: &SyncOpts) -> anyhow::Result<()> {
    let lock_path = opts.lock_file.clone().unwrap_or_else(default_lock_path);
    let Some(lock) = try_lock(&lock_path)? else {
        tracing::info!(
            "another run holds {}, nothing to do",
            lock_path.display()
        );
        return Ok(());
    };
    tracing::debug!("holding {}", lock.path().display());

    let reconciler = build_reconciler(&opts.snapshot)?;
    let mut snapshots = Snapshots::load(&opts.snapshot)?;

    let (plan, summary) = if opts.dry_run {
        run_pass(&reconciler, &mut snapshots, DryRunApi::new())?
    } else if let Some(path) = &opts.requests_out {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        run_pass(
            &reconciler,
            &mut snapshots,
            JsonLinesApi::new(BufWriter::new(file)),
        )?
    } else {
        run_pass(
            &reconciler,
            &mut snapshots,
            JsonLinesApi::new(std::io::stdout()),
        )?
    };

    eprintln!("{}", summary_line(&plan, &summary));
    if summary.has_failures() {
        bail!("{} API calls failed", summary.failures.len());
    }
    Ok(())
}

/// Two-phase pass: groups first, so hosts in new categories are not skipped.
pub fn run_pass<A: MonitoringApi>(
    reconciler: &Reconciler,
    snapshots: &mut Snapshots,
    api: A,
) -> anyhow::Result<(ReconcilePlan, ApplySummary)> {
    let mut applier = Applier::new(api);

    let missing = reconciler.missing_groups(&snapshots.cmdb.records, &snapshots.monitoring.groups);
    if !missing.is_empty() {
        tracing::info!("creating {} missing groups", missing.len());
    }
    let created = applier.create_groups(&missing);
    snapshots.monitoring.groups.extend(created);

    let plan = reconciler.reconcile(&snapshots.input())?;
    for warning in &plan.warnings {
        tracing::warn!("{warning}");
    }
    for skipped in &plan.skipped {
        tracing::warn!("{skipped}");
    }

    applier.create_hosts(&plan.creates);
    applier.update_hosts(&plan.updates);
    Ok((plan, applier.finish()))
}

fn summary_line(plan: &ReconcilePlan, summary: &ApplySummary) -> String {
    format!(
        "groups created: {}, hosts created: {}/{}, hosts updated: {}/{}, unchanged: {}, skipped: {}, unmonitored: {}, failed calls: {}",
        summary.groups_created,
        summary.hosts_created,
        plan.creates.len(),
        summary.hosts_updated,
        plan.updates.len(),
        plan.unchanged,
        plan.skipped.len(),
        plan.unmonitored,
        summary.failures.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SnapshotArgs;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures")
            .join(name)
    }

    fn snapshot_args() -> SnapshotArgs {
        SnapshotArgs {
            cmdb: fixture("cmdb.json"),
            monitoring: fixture("monitoring.json"),
            export_group: "1".into(),
            group_prefix: "CMDB".into(),
            policy: None,
        }
    }

    #[test]
    fn dry_run_pass_over_fixtures() {
        let args = snapshot_args();
        let reconciler = build_reconciler(&args).expect("reconciler");
        let mut snapshots = Snapshots::load(&args).expect("snapshots");
        let api = DryRunApi::new();
        let (plan, summary) = run_pass(&reconciler, &mut snapshots, &api).expect("pass");

        assert_eq!(summary.groups_created, 1);
        assert_eq!(plan.creates.len(), 2);
        assert_eq!(plan.skipped.len(), 1);
        assert!(!summary.has_failures());
        let methods: Vec<String> = api.requests().into_iter().map(|r| r.method).collect();
        assert_eq!(methods[0], "hostgroup.create");
        assert_eq!(methods.iter().filter(|m| *m == "host.create").count(), 2);
        assert!(snapshots
            .monitoring
            .groups
            .iter()
            .any(|g| g.name == "CMDB/Firewall"));
    }

    #[test]
    fn requests_exported_as_json_lines() {
        let args = snapshot_args();
        let reconciler = build_reconciler(&args).expect("reconciler");
        let mut snapshots = Snapshots::load(&args).expect("snapshots");
        let api = JsonLinesApi::new(Vec::new());
        run_pass(&reconciler, &mut snapshots, &api).expect("pass");
        let out = String::from_utf8(api.into_inner().expect("writer")).expect("utf8");
        let first: serde_json::Value =
            serde_json::from_str(out.lines().next().expect("line")).expect("json");
        assert_eq!(first["method"], "hostgroup.create");
        assert_eq!(first["params"]["name"], "CMDB/Firewall");
        assert_eq!(out.lines().count(), 7);
    }

    #[test]
    fn locked_run_exits_quietly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock_path = dir.path().join("sync.lock");
        let _held = try_lock(&lock_path).expect("lock").expect("acquired");
        let opts = SyncOpts {
            snapshot: SnapshotArgs {
                cmdb: PathBuf::from("/nonexistent/cmdb.json"),
                ..snapshot_args()
            },
            dry_run: true,
            requests_out: None,
            lock_file: Some(lock_path.clone()),
        };
        // The missing snapshot would fail the run if it got past the lock.
        cmd_sync(&opts).expect("no-op");
    }

    #[test]
    fn summary_line_counts() {
        let plan = ReconcilePlan {
            unchanged: 4,
            unmonitored: 1,
            ..Default::default()
        };
        let args = snapshot_args();
        let reconciler = build_reconciler(&args).expect("reconciler");
        let mut snapshots = Snapshots::load(&args).expect("snapshots");
        let (_, summary) = run_pass(&reconciler, &mut snapshots, DryRunApi::new()).expect("pass");
        let line = summary_line(&plan, &summary);
        assert!(line.contains("unchanged: 4"));
        assert!(line.contains("groups created: 1"));
    }
}
