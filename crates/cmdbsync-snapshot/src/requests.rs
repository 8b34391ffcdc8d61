//! Engine output → monitoring API calls.
//!
//! Pure builders. A patch fans out into one call per concern so a failure in
//! one never blocks the others.

use cmdbsync_core::{HostCreate, HostPatch};
use serde_json::{Map, Value, json};

/// Main interface, addressed by IP.
const INTERFACE_MAIN: u8 = 1;
const INTERFACE_USE_IP: u8 = 1;
/// Manual inventory mode, so the alias and location stick.
const INVENTORY_MANUAL: u8 = 0;

/// One API call: method name plus params.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub params: Value,
}

impl Call {
    fn new(method: &'static str, params: Value) -> Self {
        Self { method, params }
    }
}

/// `[{key: id}, ...]`, the shape the API uses for id references.
fn id_list(key: &str, ids: &[String]) -> Value {
    ids.iter()
        .map(|id| {
            let mut entry = Map::new();
            entry.insert(key.to_string(), json!(id));
            Value::Object(entry)
        })
        .collect()
}

pub fn hostgroup_create(name: &str) -> Call {
    Call::new("hostgroup.create", json!({ "name": name }))
}

pub fn host_create(create: &HostCreate) -> Call {
    let mut params = json!({
        "name": create.name,
        "host": create.host,
        "templates": id_list("templateid", &create.templates),
        "groups": id_list("groupid", &create.groups),
        "inventory_mode": INVENTORY_MANUAL,
        "interfaces": [{
            "type": create.interface.kind.code(),
            "main": INTERFACE_MAIN,
            "useip": INTERFACE_USE_IP,
            "ip": create.interface.ip,
            "dns": create.interface.dns,
            "port": create.interface.port,
        }],
        "inventory": {
            "alias": create.inventory.alias,
            "location": create.inventory.location,
            "location_lat": create.inventory.location_lat,
            "location_lon": create.inventory.location_lon,
        },
    });
    if let (Some(proxy), Some(obj)) = (&create.proxy_id, params.as_object_mut()) {
        obj.insert("proxy_hostid".into(), json!(proxy));
    }
    Call::new("host.create", params)
}

/// Fan a patch out into per-concern calls, in a fixed order: name/key,
/// templates, interface address, interface type, groups, inventory.
pub fn host_update_calls(host_id: &str, patch: &HostPatch) -> Vec<Call> {
    let mut calls = Vec::new();

    if patch.name.is_some() || patch.host.is_some() {
        let mut params = Map::new();
        params.insert("hostid".into(), json!(host_id));
        if let Some(key) = &patch.host {
            params.insert("host".into(), json!(key));
        }
        if let Some(name) = &patch.name {
            params.insert("name".into(), json!(name));
        }
        calls.push(Call::new("host.update", Value::Object(params)));
    }

    if let Some(templates) = &patch.templates {
        calls.push(Call::new(
            "host.update",
            json!({ "hostid": host_id, "templates": id_list("templateid", templates) }),
        ));
    }

    if let Some(interface_id) = &patch.interface_id {
        if patch.ip_address.is_some() || patch.dns.is_some() {
            let mut params = Map::new();
            params.insert("interfaceid".into(), json!(interface_id));
            if let Some(ip) = &patch.ip_address {
                params.insert("ip".into(), json!(ip));
            }
            if let Some(dns) = &patch.dns {
                params.insert("dns".into(), json!(dns));
            }
            calls.push(Call::new("hostinterface.update", Value::Object(params)));
        }
        if let Some(kind) = patch.interface_type {
            calls.push(Call::new(
                "hostinterface.update",
                json!({ "interfaceid": interface_id, "type": kind.code() }),
            ));
        }
    }

    if let Some(groups) = &patch.groups {
        calls.push(Call::new(
            "host.update",
            json!({ "hostid": host_id, "groups": id_list("groupid", groups) }),
        ));
    }

    if let Some(loc) = &patch.location {
        calls.push(Call::new(
            "host.update",
            json!({
                "hostid": host_id,
                "inventory": {
                    "location": loc.location,
                    "location_lat": loc.latitude,
                    "location_lon": loc.longitude,
                },
            }),
        ));
    }

    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdbsync_core::{Coordinates, HostInventory, InterfaceType, LocationPatch, NewInterface};

    fn create() -> HostCreate {
        HostCreate {
            source_id: "abc1".into(),
            name: "web-01".into(),
            host: "web-01_abc1".into(),
            templates: vec!["10001".into(), "10002".into()],
            groups: vec!["20".into(), "1".into()],
            proxy_id: None,
            interface: NewInterface {
                kind: InterfaceType::Agent,
                ip: "10.0.0.5".into(),
                dns: "web-01.example.net".into(),
                port: "10050".into(),
            },
            inventory: HostInventory {
                alias: "abc1".into(),
                location: "DC1".into(),
                location_lat: "43.25".into(),
                location_lon: "76.92".into(),
            },
        }
    }

    #[test]
    fn host_create_shape() {
        let call = host_create(&create());
        assert_eq!(call.method, "host.create");
        let p = &call.params;
        assert_eq!(p["templates"], json!([{"templateid": "10001"}, {"templateid": "10002"}]));
        assert_eq!(p["groups"], json!([{"groupid": "20"}, {"groupid": "1"}]));
        assert_eq!(p["interfaces"][0]["type"], 1);
        assert_eq!(p["interfaces"][0]["main"], 1);
        assert_eq!(p["interfaces"][0]["port"], "10050");
        assert_eq!(p["inventory"]["alias"], "abc1");
        assert!(p.get("proxy_hostid").is_none());
    }

    #[test]
    fn host_create_with_proxy() {
        let mut c = create();
        c.proxy_id = Some("501".into());
        assert_eq!(host_create(&c).params["proxy_hostid"], "501");
    }

    #[test]
    fn hostgroup_create_shape() {
        let call = hostgroup_create("CMDB/Router");
        assert_eq!(call.method, "hostgroup.create");
        assert_eq!(call.params, json!({"name": "CMDB/Router"}));
    }

    #[test]
    fn empty_patch_renders_nothing() {
        assert!(host_update_calls("100", &HostPatch::default()).is_empty());
    }

    #[test]
    fn full_patch_fans_out_per_concern() {
        let patch = HostPatch {
            name: Some("web".into()),
            host: Some("web_abc1".into()),
            templates: Some(vec!["10001".into()]),
            interface_id: Some("7".into()),
            ip_address: Some("10.0.0.5".into()),
            interface_type: Some(InterfaceType::Snmp),
            groups: Some(vec!["1".into(), "20".into()]),
            location: Some(LocationPatch::new("DC1", Coordinates::new("1", "2"))),
            ..Default::default()
        };
        let calls = host_update_calls("100", &patch);
        let methods: Vec<&str> = calls.iter().map(|c| c.method).collect();
        assert_eq!(
            methods,
            vec![
                "host.update",
                "host.update",
                "hostinterface.update",
                "hostinterface.update",
                "host.update",
                "host.update",
            ]
        );
        assert_eq!(
            calls[0].params,
            json!({"hostid": "100", "host": "web_abc1", "name": "web"})
        );
        assert_eq!(calls[2].params, json!({"interfaceid": "7", "ip": "10.0.0.5"}));
        assert_eq!(calls[3].params, json!({"interfaceid": "7", "type": 2}));
        assert_eq!(calls[4].params["groups"], json!([{"groupid": "1"}, {"groupid": "20"}]));
        assert_eq!(calls[5].params["inventory"]["location_lon"], "2");
    }

    #[test]
    fn dns_only_patch_carries_only_dns() {
        let patch = HostPatch {
            interface_id: Some("7".into()),
            dns: Some("web.example.net".into()),
            ..Default::default()
        };
        let calls = host_update_calls("100", &patch);
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].params,
            json!({"interfaceid": "7", "dns": "web.example.net"})
        );
    }
}
