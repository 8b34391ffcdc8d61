//! Record normalizer: charset cleanup and key-length bounding.
//!
//! Runs before any comparison, since the monitoring-side `unique_key` is
//! derived from the normalized name.

use crate::types::SourceRecord;

/// Maximum length of the derived monitoring-system host key.
pub const MAX_HOST_KEY_LEN: usize = 128;

/// Separator between display name and source id in the host key.
pub const KEY_SEPARATOR: char = '_';

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ' ' | '-')
}

/// Replace every character outside `[A-Za-z0-9._ -]` with `_`.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect()
}

/// Derive the monitoring-system host key for a name/id pair.
pub fn unique_key(display_name: &str, source_id: &str) -> String {
    format!("{display_name}{KEY_SEPARATOR}{source_id}")
}

/// Sanitize `display_name` and `category`, then trim the name from the end
/// so that the derived key is at most [`MAX_HOST_KEY_LEN`] characters.
///
/// Total and deterministic. `source_id` is identity and is never altered;
/// ids that cannot fit the key budget are rejected by the reconciler before
/// normalization.
pub fn normalize(mut record: SourceRecord) -> SourceRecord {
    record.display_name = sanitize(&record.display_name);
    record.category = sanitize(&record.category);

    let key_len = record.display_name.chars().count() + 1 + record.source_id.chars().count();
    if key_len > MAX_HOST_KEY_LEN {
        let overflow = key_len - MAX_HOST_KEY_LEN;
        // Sanitized names are pure ASCII, so byte and char offsets agree.
        let keep = record.display_name.len().saturating_sub(overflow);
        record.display_name.truncate(keep);
    }
    record
}

/// The key a normalized record must have on the monitoring side.
pub fn record_key(record: &SourceRecord) -> String {
    unique_key(&record.display_name, &record.source_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, id: &str) -> SourceRecord {
        SourceRecord {
            source_id: id.into(),
            display_name: name.into(),
            category: "Linux Server".into(),
            ..Default::default()
        }
    }

    #[test]
    fn sanitize_replaces_disallowed_chars() {
        assert_eq!(sanitize("Server #1!"), "Server _1_");
        assert_eq!(sanitize("db-01.prod_eu a"), "db-01.prod_eu a");
        assert_eq!(sanitize("srv/01:x"), "srv_01_x");
    }

    #[test]
    fn sanitize_replaces_each_non_ascii_char_once() {
        assert_eq!(sanitize("Сервер"), "______");
        assert_eq!(sanitize("naïve"), "na_ve");
    }

    #[test]
    fn normalize_sanitizes_category() {
        let mut rec = record("a", "x");
        rec.category = "Storage/SAN".into();
        assert_eq!(normalize(rec).category, "Storage_SAN");
    }

    #[test]
    fn short_name_untouched() {
        let rec = normalize(record("web-01", "abc1"));
        assert_eq!(rec.display_name, "web-01");
        assert_eq!(record_key(&rec), "web-01_abc1");
    }

    #[test]
    fn long_name_truncated_to_exact_budget() {
        let rec = normalize(record(&"n".repeat(130), "abcd"));
        assert_eq!(rec.display_name.len(), 123);
        assert_eq!(record_key(&rec).len(), MAX_HOST_KEY_LEN);
    }

    #[test]
    fn key_at_exact_budget_untouched() {
        let rec = normalize(record(&"n".repeat(123), "abcd"));
        assert_eq!(rec.display_name.len(), 123);
    }

    #[test]
    fn truncation_happens_after_sanitizing_multibyte_names() {
        // 130 two-byte chars become 130 underscores before the budget is applied.
        let rec = normalize(record(&"é".repeat(130), "abcd"));
        assert_eq!(rec.display_name, "_".repeat(123));
    }

    #[test]
    fn oversized_source_id_leaves_empty_name() {
        let id = "i".repeat(200);
        let rec = normalize(record("name", &id));
        assert_eq!(rec.display_name, "");
        assert_eq!(rec.source_id, id);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize(record(&format!("{}!", "x".repeat(140)), "sys01"));
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }
}
