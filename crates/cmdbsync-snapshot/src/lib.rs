//! cmdbsync-snapshot: collaborator IO boundary.
//! Parses CMDB and monitoring-system snapshot documents into engine records,
//! renders engine output into JSON-RPC requests and drives them through the
//! `MonitoringApi` seam. No reconciliation logic lives here.

pub mod api;
pub mod apply;
pub mod cmdb;
pub mod error;
pub mod field;
pub mod monitoring;
pub mod requests;

pub use api::{ApiRequest, DryRunApi, JsonLinesApi, MonitoringApi};
pub use apply::{ApplyFailure, ApplySummary, Applier};
pub use cmdb::{CmdbSnapshot, load_cmdb, parse_cmdb, split_template_refs};
pub use error::SnapshotError;
pub use monitoring::{MonitoringSnapshot, load_monitoring, parse_monitoring};
pub use requests::{Call, host_create, host_update_calls, hostgroup_create};
