//! `cmdbsync check`: data-quality report. Exit code 1 when anything needs
//! attention.

use cmdbsync_core::ReconcilePlan;

use crate::cli::CheckOpts;
use crate::config::build_reconciler;
use crate::context::Snapshots;

/// Run the check and return the process exit code.
pub fn cmd_check(opts: &CheckOpts) -> anyhow::Result<i32> {
    let reconciler = build_reconciler(&opts.snapshot)?;
    let snapshots = Snapshots::load(&opts.snapshot)?;
    let plan = reconciler.reconcile(&snapshots.input())?;

    let lines = report_lines(&plan);
    for line in &lines {
        println!("{line}");
    }
    if lines.is_empty() {
        println!("ok: no warnings, no skipped records");
        return Ok(0);
    }
    Ok(1)
}

fn report_lines(plan: &ReconcilePlan) -> Vec<String> {
    plan.warnings
        .iter()
        .map(|w| format!("warning: {w}"))
        .chain(plan.skipped.iter().map(|s| format!("error: {s}")))
        .collect()
}
