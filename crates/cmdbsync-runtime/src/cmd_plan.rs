//! `cmdbsync plan`: one pass, plan printed as JSON on stdout.

use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use cmdbsync_core::ReconcilePlan;
use serde::Serialize;

use crate::cli::PlanOpts;
use crate::config::build_reconciler;
use crate::context::Snapshots;

#[derive(Serialize)]
struct PlanReport<'a> {
    generated_at: DateTime<Utc>,
    export_group_id: &'a str,
    #[serde(flatten)]
    plan: &'a ReconcilePlan,
}

pub fn cmd_plan(opts: &PlanOpts) -> anyhow::Result<()> {
    let reconciler = build_reconciler(&opts.snapshot)?;
    let snapshots = Snapshots::load(&opts.snapshot)?;
    let plan = reconciler.reconcile(&snapshots.input())?;
    tracing::info!(
        "plan: {} groups, {} creates, {} updates, {} skipped",
        plan.groups_to_create.len(),
        plan.creates.len(),
        plan.updates.len(),
        plan.skipped.len()
    );

    let json = render_plan(&plan, &reconciler.config().export_group_id, opts.pretty, Utc::now())?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{json}").context("failed to write plan")?;
    Ok(())
}

fn render_plan(
    plan: &ReconcilePlan,
    export_group_id: &str,
    pretty: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let report = PlanReport {
        generated_at: now,
        export_group_id,
        plan,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    json.context("failed to serialize plan")
}
