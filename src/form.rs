//! Multi-language form controls.
//!
//! These are the state halves of the catalogue form widgets. A UI layer asks
//! them which tabs to draw, which tab is flagged, and what the completion
//! pills say; it feeds keystrokes back through `on_change` and gets a full
//! replacement map back. Nothing here is cached: every flag is recomputed
//! from the value passed in.

use indexmap::IndexMap;
use serde::Serialize;

use crate::languages::{Language, RestaurantLanguages};
use crate::translatable::{translation_with_fallback, TranslatableFieldValue};

/// Filled / total counter behind the completion pills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub filled: usize,
    pub total: usize,
}

impl Completion {
    /// Rounded percentage; an empty set counts as complete.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.filled * 100 + self.total / 2) / self.total).min(100) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.filled >= self.total
    }
}

/// What a tab header needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageTab {
    pub code: String,
    pub label: String,
    pub is_rtl: bool,
    pub is_active: bool,
    pub required: bool,
    pub filled: bool,
    /// Required and currently blank.
    pub has_error: bool,
}

// ---------------------------------------------------------------------------
// MultiLanguageInput / MultiLanguageTextArea
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    SingleLine,
    MultiLine { rows: u16 },
}

/// One field edited through language tabs.
#[derive(Debug, Clone)]
pub struct MultiLanguageInput {
    languages: Vec<Language>,
    kind: InputKind,
    required: bool,
    required_languages: Vec<String>,
    active_language: String,
    max_length: Option<usize>,
}

impl MultiLanguageInput {
    /// The first language starts active.
    pub fn new(languages: Vec<Language>, kind: InputKind) -> Self {
        let active_language = languages
            .first()
            .map(|l| l.code.clone())
            .unwrap_or_default();
        Self {
            languages,
            kind,
            required: false,
            required_languages: Vec::new(),
            active_language,
            max_length: None,
        }
    }

    pub fn text_area(languages: Vec<Language>, rows: u16) -> Self {
        Self::new(languages, InputKind::MultiLine { rows })
    }

    /// Marks the first language required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn required_languages<S: Into<String>>(
        mut self,
        codes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_languages = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn active_language(&self) -> &str {
        &self.active_language
    }

    /// Switch tabs. Unknown codes are ignored.
    pub fn select_language(&mut self, code: &str) -> bool {
        if self.languages.iter().any(|l| l.code == code) {
            self.active_language = code.to_string();
            true
        } else {
            false
        }
    }

    pub fn is_language_required(&self, code: &str) -> bool {
        let first = self.languages.first().is_some_and(|l| l.code == code);
        (self.required && first) || self.required_languages.iter().any(|c| c == code)
    }

    pub fn has_error(&self, value: &TranslatableFieldValue, code: &str) -> bool {
        self.is_language_required(code) && !value.is_filled(code)
    }

    pub fn has_any_error(&self, value: &TranslatableFieldValue) -> bool {
        self.languages.iter().any(|l| self.has_error(value, &l.code))
    }

    /// The text bound to the visible input.
    pub fn active_value<'v>(&self, value: &'v TranslatableFieldValue) -> &'v str {
        value.value_or_empty(&self.active_language)
    }

    /// Apply an edit and return the complete replacement map.
    pub fn on_change(
        &self,
        value: &TranslatableFieldValue,
        code: &str,
        text: &str,
    ) -> TranslatableFieldValue {
        let text = match self.max_length {
            Some(max) => text.chars().take(max).collect::<String>(),
            None => text.to_string(),
        };
        value.with(code, text)
    }

    /// Edit the active tab.
    pub fn on_active_change(
        &self,
        value: &TranslatableFieldValue,
        text: &str,
    ) -> TranslatableFieldValue {
        self.on_change(value, &self.active_language, text)
    }

    pub fn tabs(&self, value: &TranslatableFieldValue) -> Vec<LanguageTab> {
        self.languages
            .iter()
            .map(|l| LanguageTab {
                code: l.code.clone(),
                label: l.label(),
                is_rtl: l.is_rtl,
                is_active: l.code == self.active_language,
                required: self.is_language_required(&l.code),
                filled: value.is_filled(&l.code),
                has_error: self.has_error(value, &l.code),
            })
            .collect()
    }

    /// Languages filled out of all configured languages.
    pub fn completion(&self, value: &TranslatableFieldValue) -> Completion {
        Completion {
            filled: self
                .languages
                .iter()
                .filter(|l| value.is_filled(&l.code))
                .count(),
            total: self.languages.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageFormControl
// ---------------------------------------------------------------------------

/// Shared tab selector for a whole form, with completion pills and the
/// copy / bulk-fill actions. Owns the field values it tracks.
#[derive(Debug, Clone)]
pub struct LanguageFormControl {
    languages: RestaurantLanguages,
    active_language: String,
    fields: IndexMap<String, TranslatableFieldValue>,
    fallback_languages: Vec<String>,
}

impl LanguageFormControl {
    /// Starts on the default language with no tracked fields.
    pub fn new(languages: RestaurantLanguages) -> Self {
        let active_language = languages.default_language().to_string();
        Self {
            languages,
            active_language,
            fields: IndexMap::new(),
            fallback_languages: Vec::new(),
        }
    }

    /// Languages tried, in order, by [`Self::display_value`] before the
    /// restaurant default.
    pub fn with_fallback_languages<S: Into<String>>(
        mut self,
        codes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.fallback_languages = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn languages(&self) -> &RestaurantLanguages {
        &self.languages
    }

    pub fn default_language(&self) -> &str {
        self.languages.default_language()
    }

    pub fn active_language(&self) -> &str {
        &self.active_language
    }

    pub fn select_language(&mut self, code: &str) -> bool {
        if self.languages.find(code).is_some() {
            self.active_language = code.to_string();
            true
        } else {
            false
        }
    }

    /// Start tracking `key` (or replace its value).
    pub fn set_field(&mut self, key: &str, value: TranslatableFieldValue) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn field(&self, key: &str) -> Option<&TranslatableFieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &IndexMap<String, TranslatableFieldValue> {
        &self.fields
    }

    /// Set one language of one tracked field. Unknown fields and languages
    /// the restaurant does not offer are ignored.
    pub fn set_value(&mut self, key: &str, code: &str, text: &str) -> bool {
        if self.languages.find(code).is_none() {
            return false;
        }
        match self.fields.get_mut(key) {
            Some(value) => {
                value.set(code, text);
                true
            }
            None => false,
        }
    }

    /// Read-only text of `key` in `code` (list rows, previews): falls back
    /// through the configured languages, then the default language.
    pub fn display_value(&self, key: &str, code: &str) -> &str {
        let Some(value) = self.fields.get(key) else {
            return "";
        };
        let fallbacks: Vec<&str> = self
            .fallback_languages
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.default_language()))
            .collect();
        translation_with_fallback(value, code, &fallbacks)
    }

    /// Tracked fields filled in `code`.
    pub fn language_completion(&self, code: &str) -> Completion {
        Completion {
            filled: self.fields.values().filter(|v| v.is_filled(code)).count(),
            total: self.fields.len(),
        }
    }

    pub fn is_language_complete(&self, code: &str) -> bool {
        self.language_completion(code).is_complete()
    }

    /// Completion pill for every language, in tab order.
    pub fn completion_summary(&self) -> Vec<(String, Completion)> {
        self.languages
            .codes()
            .into_iter()
            .map(|code| (code.to_string(), self.language_completion(code)))
            .collect()
    }

    /// Overwrite the active language's value of `key` with the default
    /// language's value. Does nothing when the default is blank.
    pub fn copy_from_default(&mut self, key: &str) -> bool {
        let default = self.default_language().to_string();
        if self.active_language == default {
            return false;
        }
        let Some(value) = self.fields.get_mut(key) else {
            return false;
        };
        if !value.is_filled(&default) {
            return false;
        }
        let source = value.value_or_empty(&default).to_string();
        value.set(self.active_language.as_str(), source);
        true
    }

    /// Copy every tracked field's default-language value into `target`,
    /// overwriting what is there. Fields with a blank default are left
    /// alone. Returns the number of fields written.
    pub fn bulk_fill(&mut self, target: &str) -> usize {
        let default = self.default_language().to_string();
        if target == default || self.languages.find(target).is_none() {
            return 0;
        }
        let mut written = 0;
        for value in self.fields.values_mut() {
            if value.is_filled(&default) {
                let source = value.value_or_empty(&default).to_string();
                value.set(target, source);
                written += 1;
            }
        }
        written
    }

    pub fn into_fields(self) -> IndexMap<String, TranslatableFieldValue> {
        self.fields
    }
}
