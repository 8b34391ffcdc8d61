use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

// ─── Interface Type ───────────────────────────────────────────────

/// Monitoring-system interface type. Serialized as the numeric code the
/// monitoring API uses (`1` = agent, `2` = SNMP, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InterfaceType {
    Agent,
    Snmp,
    Ipmi,
    Jmx,
}

impl InterfaceType {
    pub fn code(self) -> u8 {
        match self {
            Self::Agent => 1,
            Self::Snmp => 2,
            Self::Ipmi => 3,
            Self::Jmx => 4,
        }
    }

    /// Port used when a new interface of this type is created.
    pub fn default_port(self) -> &'static str {
        match self {
            Self::Agent => "10050",
            Self::Snmp => "161",
            Self::Ipmi => "623",
            Self::Jmx => "12345",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Snmp => "snmp",
            Self::Ipmi => "ipmi",
            Self::Jmx => "jmx",
        }
    }
}

impl From<InterfaceType> for u8 {
    fn from(kind: InterfaceType) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for InterfaceType {
    type Error = EngineError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Agent),
            2 => Ok(Self::Snmp),
            3 => Ok(Self::Ipmi),
            4 => Ok(Self::Jmx),
            other => Err(EngineError::InvalidInput(format!(
                "unknown interface type code: {other}"
            ))),
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceType {
    type Err = EngineError;

    /// Accepts either the numeric API code or the lowercase name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::try_from(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "agent" => Ok(Self::Agent),
            "snmp" => Ok(Self::Snmp),
            "ipmi" => Ok(Self::Ipmi),
            "jmx" => Ok(Self::Jmx),
            _ => Err(EngineError::InvalidInput(format!(
                "unknown interface type: {s}"
            ))),
        }
    }
}

// ─── CMDB Side ────────────────────────────────────────────────────

/// One configuration item as exported by the CMDB.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Globally unique, never reused. Embedded into the host key.
    pub source_id: String,
    pub display_name: String,
    pub category: String,
    pub ip_address: String,
    #[serde(default)]
    pub fqdn: Option<String>,
    /// Symbolic key into the location index.
    #[serde(default)]
    pub location_ref: Option<String>,
    /// Location text as the CMDB displays it (empty when unset).
    #[serde(default)]
    pub location_text: String,
    #[serde(default)]
    pub template_refs: Vec<String>,
    #[serde(default)]
    pub proxy_ref: Option<String>,
}

impl SourceRecord {
    /// `fqdn` with empty strings treated as absent.
    pub fn fqdn(&self) -> Option<&str> {
        self.fqdn.as_deref().filter(|s| !s.is_empty())
    }
}

// ─── Monitoring Side ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInterface {
    pub interface_id: String,
    pub ip: String,
    pub dns: String,
    #[serde(rename = "type")]
    pub kind: InterfaceType,
}

/// A host as currently stored by the monitoring system.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitoringHost {
    pub host_id: String,
    /// Expected to equal `display_name + "_" + source_id`.
    pub unique_key: String,
    pub display_name: String,
    /// Inventory alias carrying the CMDB `source_id`. `None` when the host
    /// has no inventory.
    #[serde(default)]
    pub inventory_alias: Option<String>,
    #[serde(default)]
    pub template_ids: Vec<String>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub interfaces: Vec<HostInterface>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_lat: String,
    #[serde(default)]
    pub location_lon: String,
}

impl MonitoringHost {
    /// The interface the differ may touch: present only when the host has
    /// exactly one.
    pub fn sole_interface(&self) -> Option<&HostInterface> {
        match self.interfaces.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

// ─── Reference Entities ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntity {
    pub template_id: String,
    pub source_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEntity {
    pub proxy_id: String,
    pub source_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntity {
    pub source_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

/// Resolved geolocation. Both fields are empty when unknown; never partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: String,
    pub lon: String,
}

impl Coordinates {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        let (lat, lon) = (lat.into(), lon.into());
        if lat.is_empty() || lon.is_empty() {
            return Self::default();
        }
        Self { lat, lon }
    }
}

// ─── Creation Record ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInterface {
    #[serde(rename = "type")]
    pub kind: InterfaceType,
    pub ip: String,
    pub dns: String,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInventory {
    pub alias: String,
    pub location: String,
    pub location_lat: String,
    pub location_lon: String,
}

/// Everything needed to create one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCreate {
    pub source_id: String,
    pub name: String,
    /// Unique key (`name + "_" + source_id`).
    pub host: String,
    pub templates: Vec<String>,
    /// Category group first, export group second.
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
    pub interface: NewInterface,
    pub inventory: HostInventory,
}
