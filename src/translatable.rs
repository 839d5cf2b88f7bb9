//! Per-field, per-language value store.
//!
//! A [`TranslatableFieldValue`] holds the values of one logical entity field
//! (a product name, a category description, ...) keyed by language code. The
//! free functions in this module are the helpers the catalogue forms use to
//! seed, validate, merge, diff and convert those maps to and from the wire
//! records of the translation endpoints. They are pure and never fail.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::translation::TranslationRecord;

/// Fallback chain used when the caller does not supply one.
pub const DEFAULT_FALLBACK_LANGUAGES: &[&str] = &["en", "tr"];

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Sparse language-code -> value map for a single field.
///
/// An absent key and an empty string both mean "no value for that language".
/// Equality ignores insertion order; [`translation_with_fallback`] is the only
/// helper that looks at it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslatableFieldValue(IndexMap<String, String>);

impl TranslatableFieldValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for `code`, if the key exists.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Value for `code`, or `""` when absent.
    pub fn value_or_empty(&self, code: &str) -> &str {
        self.get(code).unwrap_or("")
    }

    /// `true` when `code` holds a non-blank value.
    pub fn is_filled(&self, code: &str) -> bool {
        self.get(code).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, code: impl Into<String>, value: impl Into<String>) {
        self.0.insert(code.into(), value.into());
    }

    /// Replacement-style update: returns a new map with `code` set to `value`
    /// and leaves `self` untouched.
    pub fn with(&self, code: &str, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.set(code, value);
        next
    }

    pub fn remove(&mut self, code: &str) -> Option<String> {
        self.0.shift_remove(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslatableFieldValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<IndexMap<String, String>> for TranslatableFieldValue {
    fn from(map: IndexMap<String, String>) -> Self {
        Self(map)
    }
}

/// Result of [`validate_translations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationValidation {
    pub is_valid: bool,
    pub missing_languages: Vec<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A map with every code in `codes` set to `""`.
pub fn empty_translations<S: AsRef<str>>(codes: &[S]) -> TranslatableFieldValue {
    codes.iter().map(|c| (c.as_ref(), "")).collect()
}

/// Report which of `required` have no value (absent or blank) in `map`.
pub fn validate_translations<S: AsRef<str>>(
    map: &TranslatableFieldValue,
    required: &[S],
) -> TranslationValidation {
    let missing_languages: Vec<String> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|code| !map.is_filled(code))
        .map(ToString::to_string)
        .collect();
    TranslationValidation {
        is_valid: missing_languages.is_empty(),
        missing_languages,
    }
}

/// Resolve a display value: `preferred` first, then each of `fallbacks` in
/// order, then the first non-empty value in insertion order, then `""`.
pub fn translation_with_fallback<'a>(
    map: &'a TranslatableFieldValue,
    preferred: &str,
    fallbacks: &[&str],
) -> &'a str {
    let non_empty = |code: &str| map.get(code).filter(|v| !v.is_empty());

    non_empty(preferred)
        .or_else(|| fallbacks.iter().find_map(|code| non_empty(*code)))
        .or_else(|| map.iter().map(|(_, v)| v).find(|v| !v.is_empty()))
        .unwrap_or("")
}

/// Shallow merge; `updates` wins per key, other keys of `existing` survive.
pub fn merge_translations(
    existing: &TranslatableFieldValue,
    updates: &TranslatableFieldValue,
) -> TranslatableFieldValue {
    let mut merged = existing.clone();
    for (code, value) in updates.iter() {
        merged.set(code, value);
    }
    merged
}

/// Shallow diff: key-count mismatch, or a shared key whose value differs.
///
/// A key replaced by a different key holding the same value is not reported.
pub fn has_translation_changes(
    original: &TranslatableFieldValue,
    current: &TranslatableFieldValue,
) -> bool {
    if original.len() != current.len() {
        return true;
    }
    original
        .iter()
        .any(|(code, value)| current.get(code).is_some_and(|other| other != value))
}

/// Project wire records onto a single field, skipping records without it.
pub fn translations_to_object(
    records: &[TranslationRecord],
    field_name: &str,
) -> TranslatableFieldValue {
    records
        .iter()
        .filter_map(|record| {
            record
                .field(field_name)
                .map(|value| (record.language_code.as_str(), value))
        })
        .collect()
}

/// Inverse of [`translations_to_object`]: one record per key of `map`.
///
/// Empty values become `None`, which the endpoint treats as "leave as is".
pub fn object_to_translations(
    map: &TranslatableFieldValue,
    entity_id: i64,
    field_name: &str,
    id_field_name: &str,
) -> Vec<TranslationRecord> {
    map.iter()
        .map(|(code, value)| {
            let mut record = TranslationRecord::new(id_field_name, entity_id, code);
            record.set_field(field_name, Some(value).filter(|v| !v.is_empty()));
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> TranslatableFieldValue {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_translations_has_exactly_the_given_keys() {
        let m = empty_translations(&["en", "tr", "de"]);
        assert_eq!(m.codes().collect::<Vec<_>>(), vec!["en", "tr", "de"]);
        assert!(m.iter().all(|(_, v)| v.is_empty()));

        let none: [&str; 0] = [];
        assert!(empty_translations(&none).is_empty());
    }

    #[test]
    fn validate_flags_absent_and_blank_languages() {
        let m = map(&[("en", "Burger"), ("tr", "   ")]);
        let result = validate_translations(&m, &["en", "tr", "de"]);
        assert!(!result.is_valid);
        assert_eq!(result.missing_languages, vec!["tr", "de"]);

        let ok = validate_translations(&m, &["en"]);
        assert!(ok.is_valid);
        assert!(ok.missing_languages.is_empty());
    }

    #[test]
    fn fallback_prefers_requested_then_chain_then_any() {
        let m = map(&[("en", ""), ("tr", "Merhaba")]);
        assert_eq!(translation_with_fallback(&m, "en", &["tr"]), "Merhaba");

        let m = map(&[("de", "Hallo"), ("fr", "Bonjour")]);
        assert_eq!(translation_with_fallback(&m, "en", &["tr"]), "Hallo");
        assert_eq!(translation_with_fallback(&m, "fr", &["de"]), "Bonjour");

        assert_eq!(
            translation_with_fallback(&TranslatableFieldValue::new(), "en", &[]),
            ""
        );
    }

    #[test]
    fn merge_keeps_untouched_keys() {
        let existing = map(&[("en", "Burger"), ("tr", "")]);
        let updates = map(&[("tr", "Hamburger"), ("de", "Burger")]);
        let merged = merge_translations(&existing, &updates);
        assert_eq!(
            merged,
            map(&[("en", "Burger"), ("tr", "Hamburger"), ("de", "Burger")])
        );
    }

    #[test]
    fn change_detection_is_shallow() {
        let m = map(&[("en", "a"), ("tr", "b")]);
        assert!(!has_translation_changes(&m, &m.clone()));
        assert!(has_translation_changes(&map(&[("en", "a")]), &map(&[("en", "b")])));
        assert!(has_translation_changes(&m, &map(&[("en", "a")])));
        // Renaming a key while keeping the value is not detected.
        assert!(!has_translation_changes(&map(&[("en", "a")]), &map(&[("tr", "a")])));
    }

    #[test]
    fn object_round_trip_drops_empty_values() {
        let m = map(&[("en", "Burger"), ("tr", "Hamburger"), ("de", "")]);
        let records = object_to_translations(&m, 1, "name", "id");
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].field("name"), None);
        assert_eq!(records[0].entity_id, 1);

        let back = translations_to_object(&records, "name");
        assert_eq!(back, map(&[("en", "Burger"), ("tr", "Hamburger")]));
    }

    #[test]
    fn with_returns_a_replacement_map() {
        let m = map(&[("en", "Burger")]);
        let next = m.with("tr", "Hamburger");
        assert_eq!(m.len(), 1);
        assert_eq!(next.get("tr"), Some("Hamburger"));
    }
}
