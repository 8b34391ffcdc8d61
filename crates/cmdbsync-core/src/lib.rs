//! cmdbsync-core: CMDB → monitoring-system reconciliation engine.
//!
//! Pure library: no IO, no logging, no async. Consumes in-memory snapshots
//! of both systems and produces the group/create/update plan collaborators
//! apply.

pub mod classify;
pub mod diff;
pub mod error;
pub mod index;
pub mod normalize;
pub mod patch;
pub mod policy;
pub mod project;
pub mod reconcile;
pub mod types;

pub use classify::{Classification, alias_index, classify, missing_categories};
pub use diff::{DiffContext, diff_host};
pub use error::{DataQualityWarning, EngineError, ReconcileError, ReferenceKind};
pub use index::{GroupIndex, ReferenceIndex, ReferenceIndexes};
pub use normalize::{MAX_HOST_KEY_LEN, normalize, record_key, sanitize, unique_key};
pub use patch::{HostPatch, LocationPatch};
pub use policy::{CategoryOverride, CategoryPolicy, CategoryRule, DEFAULT_GROUP_PREFIX};
pub use project::project_new;
pub use reconcile::{ReconcileConfig, ReconcileInput, ReconcilePlan, Reconciler, SkippedRecord};
pub use types::{
    Coordinates, Group, HostCreate, HostInterface, HostInventory, InterfaceType, LocationEntity,
    MonitoringHost, NewInterface, ProxyEntity, SourceRecord, TemplateEntity,
};
