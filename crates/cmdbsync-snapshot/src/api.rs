//! MonitoringApi trait and the two built-in sinks.
//!
//! The trait is the seam between the apply layer and whatever transport
//! talks to the monitoring system. Tests inject their own implementation.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::SnapshotError;

/// Trait for issuing monitoring-system API calls. Enables mock injection for
/// testing.
pub trait MonitoringApi: Send + Sync {
    /// Issue one call and return its `result` member.
    fn call(&self, method: &str, params: Value) -> Result<Value, SnapshotError>;
}

impl<T: MonitoringApi + ?Sized> MonitoringApi for &T {
    fn call(&self, method: &str, params: Value) -> Result<Value, SnapshotError> {
        (**self).call(method, params)
    }
}

/// One JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl ApiRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// Result shaped like the monitoring API's answer, carrying `id` as the
/// affected object id. Updates echo the id they were given.
fn synthetic_result(method: &str, params: &Value, id: &str) -> Value {
    match method {
        "hostgroup.create" => json!({ "groupids": [id] }),
        "host.create" => json!({ "hostids": [id] }),
        "host.update" => json!({ "hostids": [params.get("hostid").cloned().unwrap_or(Value::Null)] }),
        "hostinterface.update" => {
            json!({ "interfaceids": [params.get("interfaceid").cloned().unwrap_or(Value::Null)] })
        }
        _ => json!({}),
    }
}

// ─── Dry Run ──────────────────────────────────────────────────────

/// Records every request, logs it and answers with `dryrun:<n>` ids.
/// Mutates nothing.
#[derive(Debug, Default)]
pub struct DryRunApi {
    next_id: AtomicU64,
    requests: Mutex<Vec<ApiRequest>>,
}

impl DryRunApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests recorded so far, in call order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.recorded().clone()
    }

    /// The request log. Pushes and clones never leave it half-written, so a
    /// poisoned lock is recovered.
    fn recorded(&self) -> MutexGuard<'_, Vec<ApiRequest>> {
        self.requests.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("dry run request log lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl MonitoringApi for DryRunApi {
    fn call(&self, method: &str, params: Value) -> Result<Value, SnapshotError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let request = ApiRequest::new(n, method, params);
        let pretty = serde_json::to_string_pretty(&request).map_err(|e| SnapshotError::Api {
            method: method.to_string(),
            detail: e.to_string(),
        })?;
        tracing::info!("dry run request:\n{pretty}");

        let result = synthetic_result(method, &request.params, &format!("dryrun:{n}"));
        self.recorded().push(request);
        Ok(result)
    }
}

// ─── JSON Lines Export ────────────────────────────────────────────

/// Writes one JSON-RPC request per line for a transport owned elsewhere.
///
/// Created objects get `pending:<n>` ids, where `n` is the request id the
/// replaying transport substitutes with the real one.
pub struct JsonLinesApi<W: Write + Send> {
    next_id: AtomicU64,
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesApi<W> {
    pub fn new(out: W) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W, SnapshotError> {
        self.out.into_inner().map_err(|_| SnapshotError::Api {
            method: "export".into(),
            detail: "request writer poisoned".into(),
        })
    }
}

impl<W: Write + Send> MonitoringApi for JsonLinesApi<W> {
    fn call(&self, method: &str, params: Value) -> Result<Value, SnapshotError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let request = ApiRequest::new(n, method, params);
        let line = serde_json::to_string(&request).map_err(|e| SnapshotError::Api {
            method: method.to_string(),
            detail: e.to_string(),
        })?;

        let mut out = self.out.lock().map_err(|_| SnapshotError::Api {
            method: method.to_string(),
            detail: "request writer poisoned".into(),
        })?;
        writeln!(out, "{line}")?;
        out.flush()?;
        tracing::debug!("exported request {n}: {method}");

        Ok(synthetic_result(method, &request.params, &format!("pending:{n}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_records_and_answers_synthetic_ids() {
        let api = DryRunApi::new();
        let created = api
            .call("hostgroup.create", json!({"name": "CMDB/Router"}))
            .expect("ok");
        assert_eq!(created, json!({"groupids": ["dryrun:1"]}));
        let updated = api
            .call("host.update", json!({"hostid": "100", "name": "x"}))
            .expect("ok");
        assert_eq!(updated, json!({"hostids": ["100"]}));

        let recorded = api.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].method, "hostgroup.create");
        assert_eq!(recorded[1].id, 2);
    }

    #[test]
    fn dry_run_keeps_recording_after_poisoned_lock() {
        let api = DryRunApi::new();
        api.call("hostgroup.create", json!({"name": "CMDB/A"})).expect("ok");
        let poisoned = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = api.requests.lock().expect("lock");
                panic!("poison the request log");
            })
            .join()
        });
        assert!(poisoned.is_err());
        assert!(api.requests.is_poisoned());

        api.call("hostgroup.create", json!({"name": "CMDB/B"})).expect("ok");
        let recorded = api.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1].params["name"], "CMDB/B");
    }

    #[test]
    fn json_lines_writes_one_envelope_per_line() {
        let api = JsonLinesApi::new(Vec::new());
        api.call("host.create", json!({"name": "web"})).expect("ok");
        api.call("hostinterface.update", json!({"interfaceid": "7", "ip": "10.0.0.5"}))
            .expect("ok");
        let out = String::from_utf8(api.into_inner().expect("writer")).expect("utf8");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["jsonrpc"], "2.0");
        assert_eq!(first["method"], "host.create");
        assert_eq!(first["id"], 1);
        assert_eq!(first["params"]["name"], "web");
    }

    #[test]
    fn json_lines_created_ids_are_pending() {
        let api = JsonLinesApi::new(Vec::new());
        let result = api.call("host.create", json!({})).expect("ok");
        assert_eq!(result, json!({"hostids": ["pending:1"]}));
    }

    #[test]
    fn blanket_ref_impl() {
        struct Mock;
        impl MonitoringApi for Mock {
            fn call(&self, _method: &str, _params: Value) -> Result<Value, SnapshotError> {
                Ok(json!("ok"))
            }
        }
        let mock = Mock;
        let r: &Mock = &mock;
        assert_eq!(r.call("x", Value::Null).expect("ok"), json!("ok"));
    }
}
