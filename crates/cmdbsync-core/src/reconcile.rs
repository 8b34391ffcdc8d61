//! One reconciliation pass: normalize → index → classify → project/diff.
//!
//! Pure function of its inputs. Per-record failures are collected in the
//! plan and never abort the pass.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::{classify, missing_categories};
use crate::diff::{DiffContext, diff_host};
use crate::error::{DataQualityWarning, EngineError, ReconcileError};
use crate::index::{GroupIndex, ReferenceIndexes};
use crate::normalize::{MAX_HOST_KEY_LEN, normalize};
use crate::patch::HostPatch;
use crate::policy::CategoryPolicy;
use crate::project::project_new;
use crate::types::{
    Group, HostCreate, LocationEntity, MonitoringHost, ProxyEntity, SourceRecord, TemplateEntity,
};

// ─── Config & Input ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Group every synced host is attached to, besides its category group.
    pub export_group_id: String,
}

/// A consistent snapshot of both systems for one pass.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub records: &'a [SourceRecord],
    pub hosts: &'a [MonitoringHost],
    pub groups: &'a [Group],
    pub templates: &'a [TemplateEntity],
    pub proxies: &'a [ProxyEntity],
    pub locations: &'a [LocationEntity],
}

// ─── Output ───────────────────────────────────────────────────────

/// A record left out of the plan, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub source_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    pub reason: ReconcileError,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped `{}` ({})", self.display_name, self.source_id)?;
        if let Some(host_id) = &self.host_id {
            write!(f, " host {host_id}")?;
        }
        write!(f, ": {}", self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    /// Category group names to create before any host is created or updated.
    pub groups_to_create: Vec<String>,
    pub creates: Vec<HostCreate>,
    /// host_id → non-empty patch.
    pub updates: BTreeMap<String, HostPatch>,
    pub skipped: Vec<SkippedRecord>,
    pub warnings: Vec<DataQualityWarning>,
    /// Records excluded for carrying no template reference.
    pub unmonitored: usize,
    /// Existing hosts already in sync.
    pub unchanged: usize,
}

impl ReconcilePlan {
    /// Nothing to create or update.
    pub fn is_noop(&self) -> bool {
        self.groups_to_create.is_empty() && self.creates.is_empty() && self.updates.is_empty()
    }
}

// ─── Reconciler ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Reconciler {
    policy: CategoryPolicy,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(policy: CategoryPolicy, config: ReconcileConfig) -> Result<Self, EngineError> {
        if config.export_group_id.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "export group id must not be empty".into(),
            ));
        }
        Ok(Self { policy, config })
    }

    pub fn policy(&self) -> &CategoryPolicy {
        &self.policy
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Keep records that carry at least one template reference, normalized.
    /// Returns the kept records and how many were excluded.
    pub fn prepare(&self, records: &[SourceRecord]) -> (Vec<SourceRecord>, usize) {
        let kept: Vec<SourceRecord> = records
            .iter()
            .filter(|r| !r.template_refs.is_empty())
            .cloned()
            .map(normalize)
            .collect();
        let excluded = records.len() - kept.len();
        (kept, excluded)
    }

    /// Category group names the CMDB needs but the monitoring system lacks.
    pub fn missing_groups(&self, records: &[SourceRecord], groups: &[Group]) -> Vec<String> {
        let (prepared, _) = self.prepare(records);
        missing_categories(&prepared, groups, &self.policy)
    }

    /// Run a full pass over one snapshot.
    ///
    /// Fails only when the input violates the caller contract (blank ids).
    pub fn reconcile(&self, input: &ReconcileInput<'_>) -> Result<ReconcilePlan, EngineError> {
        validate(input)?;

        let (records, unmonitored) = self.prepare(input.records);
        let indexes = ReferenceIndexes::build(input.templates, input.proxies, input.locations);
        let groups = GroupIndex::build(input.groups);
        let classification = classify(&records, input.hosts);

        let mut plan = ReconcilePlan {
            groups_to_create: missing_categories(&records, input.groups, &self.policy),
            unmonitored,
            warnings: classification.warnings,
            ..Default::default()
        };
        plan.warnings
            .extend(plan.groups_to_create.iter().map(|name| {
                DataQualityWarning::UnmappedCategory {
                    category: category_of(&records, name, &self.policy),
                    group_name: name.clone(),
                }
            }));

        for record in classification.new {
            match project_new(
                record,
                &self.policy,
                &indexes,
                &groups,
                &self.config.export_group_id,
            ) {
                Ok(create) => plan.creates.push(create),
                Err(reason) => plan.skipped.push(skip(record, None, reason)),
            }
        }

        let ctx = DiffContext {
            policy: &self.policy,
            indexes: &indexes,
            groups: &groups,
            export_group_id: &self.config.export_group_id,
        };
        for (record, host) in classification.existing {
            match diff_host(record, host, &ctx) {
                Ok(patch) if patch.is_empty() => plan.unchanged += 1,
                Ok(patch) => {
                    plan.updates.entry(host.host_id.clone()).or_insert(patch);
                }
                Err(reason) => plan
                    .skipped
                    .push(skip(record, Some(&host.host_id), reason)),
            }
        }

        Ok(plan)
    }
}

fn validate(input: &ReconcileInput<'_>) -> Result<(), EngineError> {
    if let Some(pos) = input.records.iter().position(|r| r.source_id.trim().is_empty()) {
        return Err(EngineError::InvalidInput(format!(
            "CMDB record #{pos} has an empty source id"
        )));
    }
    // The id is embedded verbatim in the host key, after at least the separator.
    let id_budget = MAX_HOST_KEY_LEN - 1;
    if let Some(pos) = input
        .records
        .iter()
        .position(|r| r.source_id.chars().count() > id_budget)
    {
        return Err(EngineError::InvalidInput(format!(
            "CMDB record #{pos} has a source id longer than {id_budget} characters"
        )));
    }
    if let Some(pos) = input.hosts.iter().position(|h| h.host_id.trim().is_empty()) {
        return Err(EngineError::InvalidInput(format!(
            "monitoring host #{pos} has an empty host id"
        )));
    }
    Ok(())
}

fn skip(record: &SourceRecord, host_id: Option<&str>, reason: ReconcileError) -> SkippedRecord {
    SkippedRecord {
        source_id: record.source_id.clone(),
        display_name: record.display_name.clone(),
        host_id: host_id.map(str::to_string),
        reason,
    }
}

fn category_of(records: &[SourceRecord], group_name: &str, policy: &CategoryPolicy) -> String {
    records
        .iter()
        .find(|r| policy.group_name(&r.category) == group_name)
        .map(|r| r.category.clone())
        .unwrap_or_default()
}
