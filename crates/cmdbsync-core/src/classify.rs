//! Classifier: new vs existing records, and category groups still missing.
//!
//! Matching is exact string equality of `source_id` against the host's
//! inventory alias. No fuzzy matching.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::DataQualityWarning;
use crate::policy::CategoryPolicy;
use crate::types::{Group, MonitoringHost, SourceRecord};

/// Partition of the CMDB records for one pass.
#[derive(Debug, Clone, Default)]
pub struct Classification<'a> {
    /// Records with no host yet.
    pub new: Vec<&'a SourceRecord>,
    /// Records paired with the host carrying their alias.
    pub existing: Vec<(&'a SourceRecord, &'a MonitoringHost)>,
    pub warnings: Vec<DataQualityWarning>,
}

/// Index hosts by inventory alias. Hosts without inventory are skipped.
/// A shared alias is reported and the first host keeps it.
pub fn alias_index(
    hosts: &[MonitoringHost],
) -> (HashMap<&str, &MonitoringHost>, Vec<DataQualityWarning>) {
    let mut by_alias: HashMap<&str, &MonitoringHost> = HashMap::new();
    let mut shared: HashMap<&str, Vec<String>> = HashMap::new();

    for host in hosts {
        let Some(alias) = host.inventory_alias.as_deref().filter(|a| !a.is_empty()) else {
            continue;
        };
        match by_alias.get(alias).map(|first| first.host_id.clone()) {
            Some(first_id) => shared
                .entry(alias)
                .or_insert_with(|| vec![first_id])
                .push(host.host_id.clone()),
            None => {
                by_alias.insert(alias, host);
            }
        }
    }

    let mut warnings: Vec<DataQualityWarning> = shared
        .into_iter()
        .map(|(alias, host_ids)| DataQualityWarning::DuplicateAlias {
            alias: alias.to_string(),
            host_ids,
        })
        .collect();
    warnings.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    (by_alias, warnings)
}

/// Split records into `new` and `existing`. Every record lands in exactly
/// one side, in input order.
pub fn classify<'a>(
    records: &'a [SourceRecord],
    hosts: &'a [MonitoringHost],
) -> Classification<'a> {
    let (by_alias, mut warnings) = alias_index(hosts);
    let mut out = Classification::default();
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();

    for record in records {
        if !seen_ids.insert(record.source_id.as_str()) && reported.insert(record.source_id.as_str()) {
            warnings.push(DataQualityWarning::DuplicateSourceId {
                source_id: record.source_id.clone(),
            });
        }
        match by_alias.get(record.source_id.as_str()) {
            Some(host) => out.existing.push((record, *host)),
            None => out.new.push(record),
        }
    }
    out.warnings = warnings;
    out
}

/// Category group names that do not exist yet, sorted and deduplicated.
pub fn missing_categories(
    records: &[SourceRecord],
    groups: &[Group],
    policy: &CategoryPolicy,
) -> Vec<String> {
    let existing: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    records
        .iter()
        .map(|r| policy.group_name(&r.category))
        .filter(|name| !existing.contains(name.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
