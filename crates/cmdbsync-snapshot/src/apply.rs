//! Applier: drives a plan through a `MonitoringApi`.
//!
//! Every call is independent. A failed call is logged and recorded in the
//! summary; the remaining calls still run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cmdbsync_core::{Group, HostCreate, HostPatch};
use serde::Serialize;
use serde_json::Value;

use crate::api::MonitoringApi;
use crate::monitoring::id_string;
use crate::requests::{Call, host_create, host_update_calls, hostgroup_create};

/// One call that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub method: String,
    /// Group name, host key or host id the call was about.
    pub target: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplySummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub groups_created: usize,
    pub hosts_created: usize,
    /// Hosts whose every update call succeeded.
    pub hosts_updated: usize,
    pub calls: usize,
    pub failures: Vec<ApplyFailure>,
}

impl ApplySummary {
    fn started(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            finished_at: None,
            groups_created: 0,
            hosts_created: 0,
            hosts_updated: 0,
            calls: 0,
            failures: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct Applier<A: MonitoringApi> {
    api: A,
    summary: ApplySummary,
}

impl<A: MonitoringApi> Applier<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            summary: ApplySummary::started(Utc::now()),
        }
    }

    /// Create category groups. Returns the groups that now exist, with the
    /// ids the API assigned.
    pub fn create_groups(&mut self, names: &[String]) -> Vec<Group> {
        let mut created = Vec::with_capacity(names.len());
        for name in names {
            let Some(result) = self.issue(hostgroup_create(name), name) else {
                continue;
            };
            match first_id(&result, "groupids") {
                Some(group_id) => {
                    tracing::info!("created host group {name} ({group_id})");
                    self.summary.groups_created += 1;
                    created.push(Group {
                        group_id,
                        name: name.clone(),
                    });
                }
                None => self.fail("hostgroup.create", name, "response carried no group id"),
            }
        }
        created
    }

    pub fn create_hosts(&mut self, creates: &[HostCreate]) {
        for create in creates {
            if self.issue(host_create(create), &create.host).is_some() {
                tracing::info!("created host {}", create.host);
                self.summary.hosts_created += 1;
            }
        }
    }

    pub fn update_hosts(&mut self, updates: &BTreeMap<String, HostPatch>) {
        for (host_id, patch) in updates {
            let calls = host_update_calls(host_id, patch);
            let total = calls.len();
            let mut ok = 0;
            for call in calls {
                if self.issue(call, host_id).is_some() {
                    ok += 1;
                }
            }
            if ok == total {
                tracing::info!("updated host {host_id} ({total} calls)");
                self.summary.hosts_updated += 1;
            }
        }
    }

    /// Stamp the finish time and hand back the summary.
    pub fn finish(mut self) -> ApplySummary {
        self.summary.finished_at = Some(Utc::now());
        tracing::info!(
            "apply finished: {} groups, {} created, {} updated, {} failed calls",
            self.summary.groups_created,
            self.summary.hosts_created,
            self.summary.hosts_updated,
            self.summary.failures.len()
        );
        self.summary
    }

    fn issue(&mut self, call: Call, target: &str) -> Option<Value> {
        self.summary.calls += 1;
        tracing::debug!("{} {}", call.method, call.params);
        match self.api.call(call.method, call.params) {
            Ok(result) => Some(result),
            Err(e) => {
                self.fail(call.method, target, &e.to_string());
                None
            }
        }
    }

    fn fail(&mut self, method: &str, target: &str, detail: &str) {
        tracing::warn!("{method} for {target} failed: {detail}");
        self.summary.failures.push(ApplyFailure {
            method: method.to_string(),
            target: target.to_string(),
            detail: detail.to_string(),
        });
    }
}

/// First id in a `{"<key>": [id, ...]}` result.
fn first_id(result: &Value, key: &str) -> Option<String> {
    result
        .get(key)
        .and_then(Value::as_array)
        .and_then(|ids| ids.first())
        .map(id_string)
        .filter(|id| !id.is_empty())
}
