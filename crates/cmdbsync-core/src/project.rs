//! New-host projector: one `new` CMDB record → one host-creation record.

use crate::error::ReconcileError;
use crate::index::{GroupIndex, ReferenceIndexes};
use crate::normalize::record_key;
use crate::policy::CategoryPolicy;
use crate::types::{HostCreate, HostInventory, NewInterface, SourceRecord};

/// Build the creation record for a normalized record.
///
/// Fails when a template reference is unresolved or the category group does
/// not exist yet. Proxy and location misses degrade to "unset".
pub fn project_new(
    record: &SourceRecord,
    policy: &CategoryPolicy,
    indexes: &ReferenceIndexes,
    groups: &GroupIndex,
    export_group_id: &str,
) -> Result<HostCreate, ReconcileError> {
    let templates = indexes.resolve_templates(&record.template_refs)?;
    let rule = policy.rule_for(&record.category);
    let category_group = groups.require(&rule.group_name)?;
    let coordinates = indexes.resolve_coordinates(record.location_ref.as_deref());

    Ok(HostCreate {
        source_id: record.source_id.clone(),
        name: record.display_name.clone(),
        host: record_key(record),
        templates,
        groups: vec![category_group.to_string(), export_group_id.to_string()],
        proxy_id: indexes.resolve_proxy(record.proxy_ref.as_deref()),
        interface: NewInterface {
            kind: rule.interface_type,
            ip: record.ip_address.clone(),
            dns: record.fqdn().unwrap_or_default().to_string(),
            port: rule.interface_type.default_port().to_string(),
        },
        inventory: HostInventory {
            alias: record.source_id.clone(),
            location: record.location_text.clone(),
            location_lat: coordinates.lat,
            location_lon: coordinates.lon,
        },
    })
}
