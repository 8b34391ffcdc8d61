//! Sparse per-host patch and in-memory patch simulation.

use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, Group, InterfaceType, MonitoringHost};

/// Location text and coordinates, always patched together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPatch {
    pub location: String,
    pub latitude: String,
    pub longitude: String,
}

impl LocationPatch {
    pub fn new(location: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            location: location.into(),
            latitude: coordinates.lat,
            longitude: coordinates.lon,
        }
    }
}

/// Only the fields that differ from the current host. An empty patch means
/// "no update needed" and never leaves the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Full template list to set: current ids followed by the new ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<String>>,
    /// Set whenever any interface field is patched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<InterfaceType>,
    /// Replacement group ids: export group, then the category group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(flatten)]
    pub location: Option<LocationPatch>,
}

impl HostPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.host.is_none()
            && self.templates.is_none()
            && self.ip_address.is_none()
            && self.dns.is_none()
            && self.interface_type.is_none()
            && self.groups.is_none()
            && self.location.is_none()
    }

    /// Whether any interface-level field is set.
    pub fn touches_interface(&self) -> bool {
        self.ip_address.is_some() || self.dns.is_some() || self.interface_type.is_some()
    }

    /// Simulate the monitoring system applying this patch.
    ///
    /// `groups` resolves group ids back to names. Unknown ids keep an empty
    /// name.
    pub fn apply_to(&self, host: &mut MonitoringHost, groups: &[Group]) {
        if let Some(name) = &self.name {
            host.display_name = name.clone();
        }
        if let Some(key) = &self.host {
            host.unique_key = key.clone();
        }
        if let Some(templates) = &self.templates {
            host.template_ids = templates.clone();
        }
        let target = self.interface_id.as_ref().and_then(|id| {
            host.interfaces
                .iter_mut()
                .find(|i| &i.interface_id == id)
        });
        if let Some(iface) = target {
            if let Some(ip) = &self.ip_address {
                iface.ip = ip.clone();
            }
            if let Some(dns) = &self.dns {
                iface.dns = dns.clone();
            }
            if let Some(kind) = self.interface_type {
                iface.kind = kind;
            }
        }
        if let Some(ids) = &self.groups {
            host.groups = ids
                .iter()
                .map(|id| Group {
                    group_id: id.clone(),
                    name: groups
                        .iter()
                        .find(|g| &g.group_id == id)
                        .map(|g| g.name.clone())
                        .unwrap_or_default(),
                })
                .collect();
        }
        if let Some(loc) = &self.location {
            host.location = loc.location.clone();
            host.location_lat = loc.latitude.clone();
            host.location_lon = loc.longitude.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HostInterface;

    fn host() -> MonitoringHost {
        MonitoringHost {
            host_id: "100".into(),
            unique_key: "old_abc1".into(),
            display_name: "old".into(),
            interfaces: vec![HostInterface {
                interface_id: "7".into(),
                ip: "10.0.0.9".into(),
                dns: String::new(),
                kind: InterfaceType::Snmp,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(HostPatch::default().is_empty());
        let patch = HostPatch {
            dns: Some("x".into()),
            interface_id: Some("7".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert!(patch.touches_interface());
    }

    #[test]
    fn serializes_sparse_and_flat() {
        let patch = HostPatch {
            name: Some("web".into()),
            interface_type: Some(InterfaceType::Agent),
            interface_id: Some("7".into()),
            location: Some(LocationPatch::new("DC1", Coordinates::new("1.5", "2.5"))),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "web",
                "interface_id": "7",
                "interface_type": 1,
                "location": "DC1",
                "latitude": "1.5",
                "longitude": "2.5",
            })
        );
    }

    #[test]
    fn apply_to_updates_targeted_fields() {
        let mut h = host();
        let groups = vec![Group {
            group_id: "3".into(),
            name: "CMDB/Router".into(),
        }];
        let patch = HostPatch {
            name: Some("new".into()),
            host: Some("new_abc1".into()),
            interface_id: Some("7".into()),
            ip_address: Some("10.0.0.5".into()),
            interface_type: Some(InterfaceType::Agent),
            groups: Some(vec!["3".into(), "4".into()]),
            ..Default::default()
        };
        patch.apply_to(&mut h, &groups);
        assert_eq!(h.display_name, "new");
        assert_eq!(h.unique_key, "new_abc1");
        assert_eq!(h.interfaces[0].ip, "10.0.0.5");
        assert_eq!(h.interfaces[0].kind, InterfaceType::Agent);
        assert_eq!(h.groups[0].name, "CMDB/Router");
        assert_eq!(h.groups[1].name, "");
    }

    #[test]
    fn apply_to_ignores_unknown_interface() {
        let mut h = host();
        let patch = HostPatch {
            interface_id: Some("99".into()),
            ip_address: Some("1.1.1.1".into()),
            ..Default::default()
        };
        patch.apply_to(&mut h, &[]);
        assert_eq!(h.interfaces[0].ip, "10.0.0.9");
    }
}
