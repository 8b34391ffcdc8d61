//! CMDB snapshot document → `SourceRecord`s and location entities.

use std::path::Path;

use cmdbsync_core::{LocationEntity, SourceRecord};
use serde::Deserialize;

use crate::error::SnapshotError;
use crate::field::{Field, display_of, non_empty, raw_of, value_of};

/// Everything the engine needs from the CMDB side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmdbSnapshot {
    pub records: Vec<SourceRecord>,
    pub locations: Vec<LocationEntity>,
}

#[derive(Debug, Deserialize)]
struct CmdbDocument {
    #[serde(default)]
    records: Vec<RawConfigItem>,
    #[serde(default)]
    locations: Vec<RawLocation>,
}

/// One configuration item row as the CMDB table API returns it.
#[derive(Debug, Deserialize)]
struct RawConfigItem {
    sys_id: Option<Field>,
    name: Option<Field>,
    /// Class; the displayed label is the category.
    sys_class_name: Option<Field>,
    ip_address: Option<Field>,
    fqdn: Option<Field>,
    location: Option<Field>,
    /// Comma-separated template keys.
    monitoring_templates: Option<Field>,
    monitoring_proxy: Option<Field>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    sys_id: Option<Field>,
    name: Option<Field>,
    latitude: Option<Field>,
    longitude: Option<Field>,
}

/// Split the CMDB's comma-separated template field. Whitespace is trimmed and
/// empty entries are dropped.
pub fn split_template_refs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_cmdb(path: &Path) -> Result<CmdbSnapshot, SnapshotError> {
    let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&json, &path.display().to_string())
}

pub fn parse_cmdb(json: &str) -> Result<CmdbSnapshot, SnapshotError> {
    parse_document(json, "CMDB snapshot")
}

fn parse_document(json: &str, origin: &str) -> Result<CmdbSnapshot, SnapshotError> {
    let doc: CmdbDocument = serde_json::from_str(json).map_err(|source| SnapshotError::Json {
        origin: origin.to_string(),
        source,
    })?;

    let records = doc
        .records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| to_record(index, raw))
        .collect::<Result<Vec<_>, _>>()?;
    let locations = doc
        .locations
        .into_iter()
        .filter_map(to_location)
        .collect();

    tracing::debug!("parsed {} CMDB records from {origin}", records.len());
    Ok(CmdbSnapshot { records, locations })
}

fn to_record(index: usize, raw: RawConfigItem) -> Result<SourceRecord, SnapshotError> {
    let source_id = value_of(raw.sys_id.as_ref());
    if source_id.is_empty() {
        return Err(SnapshotError::InvalidRecord {
            index,
            detail: "missing sys_id".into(),
        });
    }

    Ok(SourceRecord {
        source_id,
        display_name: raw_of(raw.name.as_ref()),
        category: display_of(raw.sys_class_name.as_ref()),
        ip_address: value_of(raw.ip_address.as_ref()),
        fqdn: non_empty(raw.fqdn.as_ref()),
        location_ref: non_empty(raw.location.as_ref()),
        location_text: display_of(raw.location.as_ref()),
        template_refs: split_template_refs(&value_of(raw.monitoring_templates.as_ref())),
        proxy_ref: non_empty(raw.monitoring_proxy.as_ref()),
    })
}

/// Locations without a key cannot be referenced and are dropped.
fn to_location(raw: RawLocation) -> Option<LocationEntity> {
    let source_key = non_empty(raw.sys_id.as_ref())?;
    Some(LocationEntity {
        source_key,
        name: value_of(raw.name.as_ref()),
        latitude: value_of(raw.latitude.as_ref()),
        longitude: value_of(raw.longitude.as_ref()),
    })
}
