//! Monitoring-system snapshot document → hosts, groups and reference
//! entities.
//!
//! The document mirrors the monitoring API's `host.get`, `hostgroup.get`,
//! `template.get` and `proxy.get` results. Ids arrive as strings or numbers.

use std::path::Path;

use cmdbsync_core::{
    Group, HostInterface, InterfaceType, MonitoringHost, ProxyEntity, TemplateEntity,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::SnapshotError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoringSnapshot {
    pub hosts: Vec<MonitoringHost>,
    pub groups: Vec<Group>,
    pub templates: Vec<TemplateEntity>,
    pub proxies: Vec<ProxyEntity>,
}

#[derive(Debug, Deserialize)]
struct MonitoringDocument {
    #[serde(default)]
    hosts: Vec<RawHost>,
    #[serde(default)]
    groups: Vec<RawGroup>,
    #[serde(default)]
    templates: Vec<RawTemplate>,
    #[serde(default)]
    proxies: Vec<RawProxy>,
}

#[derive(Debug, Deserialize)]
struct RawHost {
    hostid: Value,
    #[serde(default)]
    host: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inventory: Option<RawInventory>,
    #[serde(default)]
    groups: Vec<RawGroup>,
    #[serde(default, rename = "parentTemplates")]
    parent_templates: Vec<RawTemplateRef>,
    #[serde(default)]
    interfaces: Vec<RawInterface>,
}

/// Hosts with inventory disabled report `[]` instead of an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInventory {
    Disabled(Vec<Value>),
    Fields {
        #[serde(default)]
        alias: String,
        #[serde(default)]
        location: String,
        #[serde(default)]
        location_lat: String,
        #[serde(default)]
        location_lon: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    groupid: Value,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawTemplateRef {
    templateid: Value,
}

#[derive(Debug, Deserialize)]
struct RawInterface {
    interfaceid: Value,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    dns: String,
    #[serde(rename = "type")]
    kind: Value,
}

/// `host` is the technical template name the CMDB references.
#[derive(Debug, Deserialize)]
struct RawTemplate {
    templateid: Value,
    host: String,
}

#[derive(Debug, Deserialize)]
struct RawProxy {
    proxyid: Value,
    host: String,
}

pub fn load_monitoring(path: &Path) -> Result<MonitoringSnapshot, SnapshotError> {
    let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&json, &path.display().to_string())
}

pub fn parse_monitoring(json: &str) -> Result<MonitoringSnapshot, SnapshotError> {
    parse_document(json, "monitoring snapshot")
}

fn parse_document(json: &str, origin: &str) -> Result<MonitoringSnapshot, SnapshotError> {
    let doc: MonitoringDocument =
        serde_json::from_str(json).map_err(|source| SnapshotError::Json {
            origin: origin.to_string(),
            source,
        })?;

    let hosts = doc
        .hosts
        .into_iter()
        .enumerate()
        .map(|(index, raw)| to_host(index, raw))
        .collect::<Result<Vec<_>, _>>()?;
    let groups = doc.groups.into_iter().map(to_group).collect();
    let templates = doc
        .templates
        .into_iter()
        .map(|t| TemplateEntity {
            template_id: id_string(&t.templateid),
            source_key: t.host,
        })
        .collect();
    let proxies = doc
        .proxies
        .into_iter()
        .map(|p| ProxyEntity {
            proxy_id: id_string(&p.proxyid),
            source_key: p.host,
        })
        .collect();

    tracing::debug!("parsed {} monitoring hosts from {origin}", hosts.len());
    Ok(MonitoringSnapshot {
        hosts,
        groups,
        templates,
        proxies,
    })
}

/// Render an API id (string or number) as a string. Anything else is empty.
pub(crate) fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn to_group(raw: RawGroup) -> Group {
    Group {
        group_id: id_string(&raw.groupid),
        name: raw.name,
    }
}

fn to_host(index: usize, raw: RawHost) -> Result<MonitoringHost, SnapshotError> {
    let host_id = id_string(&raw.hostid);
    if host_id.is_empty() {
        return Err(SnapshotError::InvalidRecord {
            index,
            detail: "missing hostid".into(),
        });
    }

    let interfaces = raw
        .interfaces
        .into_iter()
        .map(|i| {
            let kind = parse_interface_type(&i.kind).map_err(|detail| {
                SnapshotError::InvalidRecord {
                    index,
                    detail: format!("host {host_id}: {detail}"),
                }
            })?;
            Ok(HostInterface {
                interface_id: id_string(&i.interfaceid),
                ip: i.ip,
                dns: i.dns,
                kind,
            })
        })
        .collect::<Result<Vec<_>, SnapshotError>>()?;

    let mut host = MonitoringHost {
        host_id,
        unique_key: raw.host,
        display_name: raw.name,
        template_ids: raw
            .parent_templates
            .iter()
            .map(|t| id_string(&t.templateid))
            .collect(),
        groups: raw.groups.into_iter().map(to_group).collect(),
        interfaces,
        ..Default::default()
    };
    if let Some(RawInventory::Fields {
        alias,
        location,
        location_lat,
        location_lon,
    }) = raw.inventory
    {
        host.inventory_alias = Some(alias).filter(|a| !a.is_empty());
        host.location = location;
        host.location_lat = location_lat;
        host.location_lon = location_lon;
    }
    Ok(host)
}

fn parse_interface_type(value: &Value) -> Result<InterfaceType, String> {
    id_string(value)
        .parse::<InterfaceType>()
        .map_err(|e| e.to_string())
}
