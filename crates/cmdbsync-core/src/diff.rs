//! Update differ: compare an existing CMDB record against its host and
//! produce the minimal patch.
//!
//! Rules, in order:
//! 1. name/key: a key change always carries the name with it
//! 2. templates: append-only union, never removes
//! 3. interface ip/dns: single-interface hosts only
//! 4. interface type: from the category policy, single-interface hosts only
//! 5. groups: total replacement with [export, category] unless the host
//!    already sits in exactly its own category group
//! 6. location: text and coordinates together

use crate::error::ReconcileError;
use crate::index::{GroupIndex, ReferenceIndexes};
use crate::normalize::record_key;
use crate::patch::{HostPatch, LocationPatch};
use crate::policy::CategoryPolicy;
use crate::types::{Group, InterfaceType, MonitoringHost, SourceRecord};

/// Everything the differ resolves through. Read-only for the whole pass.
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    pub policy: &'a CategoryPolicy,
    pub indexes: &'a ReferenceIndexes,
    pub groups: &'a GroupIndex,
    pub export_group_id: &'a str,
}

/// Compute the patch for one normalized record and its host.
///
/// The returned patch may be empty; callers drop empty patches.
pub fn diff_host(
    record: &SourceRecord,
    host: &MonitoringHost,
    ctx: &DiffContext<'_>,
) -> Result<HostPatch, ReconcileError> {
    let mut patch = HostPatch::default();

    diff_name(record, host, &mut patch);
    diff_templates(record, host, ctx.indexes, &mut patch)?;
    diff_interface(record, host, ctx.policy, &mut patch);
    diff_groups(record, host, ctx, &mut patch)?;
    diff_location(record, host, ctx.indexes, &mut patch);

    Ok(patch)
}

fn diff_name(record: &SourceRecord, host: &MonitoringHost, patch: &mut HostPatch) {
    if record.display_name != host.display_name {
        patch.name = Some(record.display_name.clone());
    }
    let key = record_key(record);
    if key != host.unique_key {
        patch.host = Some(key);
        // The monitoring API wants both set together when the key changes.
        patch.name = Some(record.display_name.clone());
    }
}

fn diff_templates(
    record: &SourceRecord,
    host: &MonitoringHost,
    indexes: &ReferenceIndexes,
    patch: &mut HostPatch,
) -> Result<(), ReconcileError> {
    let resolved = indexes.resolve_templates(&record.template_refs)?;
    let added: Vec<String> = resolved
        .into_iter()
        .filter(|id| !host.template_ids.contains(id))
        .collect();
    if !added.is_empty() {
        let mut templates = host.template_ids.clone();
        templates.extend(added);
        patch.templates = Some(templates);
    }
    Ok(())
}

fn diff_interface(
    record: &SourceRecord,
    host: &MonitoringHost,
    policy: &CategoryPolicy,
    patch: &mut HostPatch,
) {
    let Some(iface) = host.sole_interface() else {
        return;
    };

    if record.ip_address != iface.ip {
        patch.ip_address = Some(record.ip_address.clone());
    }
    if let Some(fqdn) = record.fqdn().filter(|f| *f != iface.dns) {
        patch.dns = Some(fqdn.to_string());
    }

    let wanted = policy.interface_type(&record.category);
    if wanted != iface.kind && is_switchable(wanted) && is_switchable(iface.kind) {
        patch.interface_type = Some(wanted);
    }

    if patch.touches_interface() {
        patch.interface_id = Some(iface.interface_id.clone());
    }
}

/// Only agent/SNMP interfaces are flipped; other types are left alone.
fn is_switchable(kind: InterfaceType) -> bool {
    matches!(kind, InterfaceType::Agent | InterfaceType::Snmp)
}

fn diff_groups(
    record: &SourceRecord,
    host: &MonitoringHost,
    ctx: &DiffContext<'_>,
    patch: &mut HostPatch,
) -> Result<(), ReconcileError> {
    let wanted = ctx.policy.group_name(&record.category);
    let category_groups: Vec<&Group> = host
        .groups
        .iter()
        .filter(|g| g.group_id != ctx.export_group_id && ctx.policy.is_category_group(g))
        .collect();

    if matches!(category_groups.as_slice(), [only] if only.name == wanted) {
        return Ok(());
    }

    let category_group = ctx.groups.require(&wanted)?;
    patch.groups = Some(vec![
        ctx.export_group_id.to_string(),
        category_group.to_string(),
    ]);
    Ok(())
}

fn diff_location(
    record: &SourceRecord,
    host: &MonitoringHost,
    indexes: &ReferenceIndexes,
    patch: &mut HostPatch,
) {
    if record.location_text != host.location {
        let coordinates = indexes.resolve_coordinates(record.location_ref.as_deref());
        patch.location = Some(LocationPatch::new(record.location_text.clone(), coordinates));
    }
}
