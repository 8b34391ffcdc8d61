//! Reference indexes: CMDB symbolic key → monitoring-system value.
//!
//! Built once per pass from flat entity lists; read-only afterwards.

use std::collections::HashMap;

use crate::error::{ReconcileError, ReferenceKind};
use crate::types::{Coordinates, Group, LocationEntity, ProxyEntity, TemplateEntity};

/// Lookup table for one reference kind. The first entity for a key wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceIndex<V> {
    kind: ReferenceKind,
    entries: HashMap<String, V>,
}

impl<V> ReferenceIndex<V> {
    pub fn new(kind: ReferenceKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn from_pairs(kind: ReferenceKind, pairs: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut index = Self::new(kind);
        for (key, value) in pairs {
            index.entries.entry(key).or_insert(value);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a symbolic key or fail with `ReferenceNotFound`.
    pub fn resolve(&self, key: &str) -> Result<&V, ReconcileError> {
        self.entries
            .get(key)
            .ok_or_else(|| ReconcileError::ReferenceNotFound {
                reference: self.kind,
                key: key.to_string(),
            })
    }

    /// Resolve an optional key, treating a miss as absence.
    pub fn resolve_optional(&self, key: Option<&str>) -> Option<&V> {
        key.and_then(|k| self.entries.get(k))
    }
}

/// The three indexes a pass resolves references through.
#[derive(Debug, Clone)]
pub struct ReferenceIndexes {
    pub templates: ReferenceIndex<String>,
    pub proxies: ReferenceIndex<String>,
    pub locations: ReferenceIndex<Coordinates>,
}

impl ReferenceIndexes {
    pub fn build(
        templates: &[TemplateEntity],
        proxies: &[ProxyEntity],
        locations: &[LocationEntity],
    ) -> Self {
        Self {
            templates: ReferenceIndex::from_pairs(
                ReferenceKind::Template,
                templates
                    .iter()
                    .map(|t| (t.source_key.clone(), t.template_id.clone())),
            ),
            proxies: ReferenceIndex::from_pairs(
                ReferenceKind::Proxy,
                proxies
                    .iter()
                    .map(|p| (p.source_key.clone(), p.proxy_id.clone())),
            ),
            locations: ReferenceIndex::from_pairs(
                ReferenceKind::Location,
                locations.iter().map(|l| {
                    (
                        l.source_key.clone(),
                        Coordinates::new(l.latitude.clone(), l.longitude.clone()),
                    )
                }),
            ),
        }
    }

    /// Resolve every template reference in order, deduplicated.
    /// Any miss fails the whole list.
    pub fn resolve_templates(&self, refs: &[String]) -> Result<Vec<String>, ReconcileError> {
        let mut ids: Vec<String> = Vec::with_capacity(refs.len());
        for key in refs {
            let id = self.templates.resolve(key)?;
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        Ok(ids)
    }

    /// Proxies are optional: an unresolved key leaves the proxy unset.
    pub fn resolve_proxy(&self, key: Option<&str>) -> Option<String> {
        self.proxies.resolve_optional(key).cloned()
    }

    /// Unresolved or absent locations yield empty coordinates.
    pub fn resolve_coordinates(&self, key: Option<&str>) -> Coordinates {
        self.locations
            .resolve_optional(key)
            .cloned()
            .unwrap_or_default()
    }
}

/// Group name → group id, for exact-name lookups.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    by_name: HashMap<String, String>,
}

impl GroupIndex {
    pub fn build(groups: &[Group]) -> Self {
        let mut by_name = HashMap::with_capacity(groups.len());
        for g in groups {
            by_name
                .entry(g.name.clone())
                .or_insert_with(|| g.group_id.clone());
        }
        Self { by_name }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Look up a group id by exact name, or fail with `MissingGroup`.
    pub fn require(&self, name: &str) -> Result<&str, ReconcileError> {
        self.by_name
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ReconcileError::MissingGroup {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexes() -> ReferenceIndexes {
        ReferenceIndexes::build(
            &[
                TemplateEntity {
                    template_id: "10001".into(),
                    source_key: "T1".into(),
                },
                TemplateEntity {
                    template_id: "10002".into(),
                    source_key: "T2".into(),
                },
                TemplateEntity {
                    template_id: "99999".into(),
                    source_key: "T1".into(),
                },
            ],
            &[ProxyEntity {
                proxy_id: "501".into(),
                source_key: "P1".into(),
            }],
            &[
                LocationEntity {
                    source_key: "L1".into(),
                    name: "Almaty DC".into(),
                    latitude: "43.25".into(),
                    longitude: "76.92".into(),
                },
                LocationEntity {
                    source_key: "L2".into(),
                    name: "Nowhere".into(),
                    latitude: String::new(),
                    longitude: "1.0".into(),
                },
            ],
        )
    }

    #[test]
    fn first_entity_wins_on_duplicate_key() {
        let idx = indexes();
        assert_eq!(idx.templates.len(), 2);
        assert_eq!(idx.templates.resolve("T1").expect("T1"), "10001");
    }

    #[test]
    fn missing_template_is_reference_not_found() {
        let idx = indexes();
        let err = idx.templates.resolve("T9").expect_err("missing");
        assert_eq!(
            err,
            ReconcileError::ReferenceNotFound {
                reference: ReferenceKind::Template,
                key: "T9".into(),
            }
        );
    }

    #[test]
    fn resolve_templates_dedups_in_order() {
        let idx = indexes();
        let refs = vec!["T2".to_string(), "T1".to_string(), "T2".to_string()];
        assert_eq!(
            idx.resolve_templates(&refs).expect("resolved"),
            vec!["10002".to_string(), "10001".to_string()]
        );
    }

    #[test]
    fn resolve_templates_fails_on_any_miss() {
        let idx = indexes();
        let refs = vec!["T1".to_string(), "nope".to_string()];
        assert!(idx.resolve_templates(&refs).is_err());
    }

    #[test]
    fn unresolved_proxy_is_unset() {
        let idx = indexes();
        assert_eq!(idx.resolve_proxy(Some("P1")), Some("501".to_string()));
        assert_eq!(idx.resolve_proxy(Some("P9")), None);
        assert_eq!(idx.resolve_proxy(None), None);
    }

    #[test]
    fn group_index_requires_exact_name() {
        let groups = GroupIndex::build(&[Group {
            group_id: "12".into(),
            name: "CMDB/Router".into(),
        }]);
        assert_eq!(groups.require("CMDB/Router").expect("present"), "12");
        assert!(groups.contains("CMDB/Router"));
        assert_eq!(
            groups.require("CMDB/router").expect_err("case differs"),
            ReconcileError::MissingGroup {
                name: "CMDB/router".into()
            }
        );
    }

    #[test]
    fn unresolved_location_is_empty_coordinates() {
        let idx = indexes();
        assert_eq!(idx.resolve_coordinates(Some("L1")).lat, "43.25");
        assert_eq!(idx.resolve_coordinates(Some("L9")), Coordinates::default());
        assert_eq!(idx.resolve_coordinates(None), Coordinates::default());
        // Partial coordinates collapse to empty.
        assert_eq!(idx.resolve_coordinates(Some("L2")), Coordinates::default());
    }
}
