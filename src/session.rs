//! Translation state of one open entity form.
//!
//! Lifecycle:
//! `Unloaded -> LoadingLanguages -> LanguagesReady -> LoadingTranslations ->
//! Populated -> Editing -> Submitting -> Closed`.
//!
//! A failed translation fetch still ends in `Populated`, with only the
//! default language seeded from the entity's own values. A failed base save
//! returns the form to `Editing`; a failed translation save does not.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::Transport;
use crate::error::ApiError;
use crate::form::LanguageFormControl;
use crate::languages::RestaurantLanguages;
use crate::translatable::{
    empty_translations, has_translation_changes, merge_translations, validate_translations,
    TranslatableFieldValue, DEFAULT_FALLBACK_LANGUAGES,
};
use crate::translation::{
    BatchUpsertRequest, TranslationEntity, TranslationFetchResult, TranslationService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Unloaded,
    LoadingLanguages,
    LanguagesReady,
    LoadingTranslations,
    Populated,
    Editing,
    Submitting,
    Closed,
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot move translation form from {from} to {to}")]
    InvalidTransition { from: FormPhase, to: FormPhase },
    #[error("no tracked field named {0}")]
    UnknownField(String),
    #[error("language {0} is not offered by this restaurant")]
    UnknownLanguage(String),
}

pub struct TranslationFormSession {
    entity: TranslationEntity,
    entity_id: Option<i64>,
    phase: FormPhase,
    control: Option<LanguageFormControl>,
    original: IndexMap<String, TranslatableFieldValue>,
    field_errors: IndexMap<String, Vec<String>>,
    fallback_languages: Vec<String>,
}

impl TranslationFormSession {
    /// `entity_id` is `None` for a create form; it becomes known once the
    /// base save succeeds.
    pub fn new(entity: TranslationEntity, entity_id: Option<i64>) -> Self {
        Self {
            entity,
            entity_id,
            phase: FormPhase::Unloaded,
            control: None,
            original: IndexMap::new(),
            field_errors: IndexMap::new(),
            fallback_languages: DEFAULT_FALLBACK_LANGUAGES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Display fallback order, usually [`crate::ClientConfig::fallback_languages`].
    pub fn with_fallback_languages<S: Into<String>>(
        mut self,
        codes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.fallback_languages = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn entity(&self) -> TranslationEntity {
        self.entity
    }

    pub fn entity_id(&self) -> Option<i64> {
        self.entity_id
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn control(&self) -> Option<&LanguageFormControl> {
        self.control.as_ref()
    }

    pub fn control_mut(&mut self) -> Option<&mut LanguageFormControl> {
        self.control.as_mut()
    }

    pub fn field_errors(&self) -> &IndexMap<String, Vec<String>> {
        &self.field_errors
    }

    fn transition(&mut self, allowed: &[FormPhase], to: FormPhase) -> Result<(), SessionError> {
        if !allowed.contains(&self.phase) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        debug!(entity = %self.entity, from = %self.phase, to = %to, "translation form phase");
        self.phase = to;
        Ok(())
    }

    pub fn begin_loading_languages(&mut self) -> Result<(), SessionError> {
        self.transition(&[FormPhase::Unloaded], FormPhase::LoadingLanguages)
    }

    /// Seed every tracked field with an empty value per language.
    pub fn languages_loaded(&mut self, languages: RestaurantLanguages) -> Result<(), SessionError> {
        self.transition(
            &[FormPhase::Unloaded, FormPhase::LoadingLanguages],
            FormPhase::LanguagesReady,
        )?;
        let codes = languages.codes();
        let mut control = LanguageFormControl::new(languages.clone())
            .with_fallback_languages(self.fallback_languages.iter().cloned());
        for field in self.entity.fields() {
            control.set_field(field, empty_translations(&codes));
        }
        self.original = control.fields().clone();
        self.control = Some(control);
        Ok(())
    }

    pub fn begin_loading_translations(&mut self) -> Result<(), SessionError> {
        self.transition(&[FormPhase::LanguagesReady], FormPhase::LoadingTranslations)
    }

    /// Merge a fetch result over the seeded values.
    ///
    /// `base_values` are the entity's current field values (its default
    /// language). They fill any default-language slot the fetch left blank,
    /// and are all there is when the fetch failed.
    pub fn apply_fetch(
        &mut self,
        fetched: Result<TranslationFetchResult, ApiError>,
        base_values: &IndexMap<String, String>,
    ) -> Result<(), SessionError> {
        self.transition(
            &[FormPhase::LanguagesReady, FormPhase::LoadingTranslations],
            FormPhase::Populated,
        )?;
        let Some(control) = self.control.as_mut() else {
            return Ok(());
        };
        let default = control.default_language().to_string();

        let fetched = match fetched {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(
                    entity = %self.entity,
                    entity_id = ?self.entity_id,
                    error = %err,
                    "translation fetch failed, continuing with base values only"
                );
                None
            }
        };

        let keys: Vec<String> = control.fields().keys().cloned().collect();
        for key in keys {
            let mut value = control.field(&key).cloned().unwrap_or_default();
            if let Some(result) = &fetched {
                value = merge_translations(&value, &result.field_values(&key));
            }
            if !value.is_filled(&default) {
                let base = fetched
                    .as_ref()
                    .and_then(|r| r.base_values())
                    .and_then(|b| b.get(&key))
                    .or_else(|| base_values.get(&key));
                if let Some(base) = base {
                    value.set(default.as_str(), base.as_str());
                }
            }
            control.set_field(&key, value);
        }
        self.original = control.fields().clone();
        Ok(())
    }

    /// Fetch and apply existing translations. Never fails on the fetch
    /// itself; see [`Self::apply_fetch`].
    pub async fn load<T: Transport>(
        &mut self,
        service: &TranslationService<'_, T>,
        base_values: &IndexMap<String, String>,
    ) -> Result<(), SessionError> {
        self.begin_loading_translations()?;
        let fetched = match self.entity_id {
            Some(id) => service.get_translations(id).await,
            None => Ok(TranslationFetchResult::Flat(Vec::new())),
        };
        self.apply_fetch(fetched, base_values)
    }

    /// Apply a keystroke to one field/language.
    pub fn edit(&mut self, field: &str, code: &str, text: &str) -> Result<(), SessionError> {
        self.transition(&[FormPhase::Populated, FormPhase::Editing], FormPhase::Editing)?;
        let control = self
            .control
            .as_mut()
            .ok_or_else(|| SessionError::UnknownField(field.to_string()))?;
        if control.languages().find(code).is_none() {
            return Err(SessionError::UnknownLanguage(code.to_string()));
        }
        if !control.set_value(field, code, text) {
            return Err(SessionError::UnknownField(field.to_string()));
        }
        self.field_errors.shift_remove(field);
        Ok(())
    }

    pub fn copy_from_default(&mut self, field: &str) -> Result<bool, SessionError> {
        self.transition(&[FormPhase::Populated, FormPhase::Editing], FormPhase::Editing)?;
        Ok(self
            .control
            .as_mut()
            .is_some_and(|c| c.copy_from_default(field)))
    }

    pub fn bulk_fill(&mut self, target: &str) -> Result<usize, SessionError> {
        self.transition(&[FormPhase::Populated, FormPhase::Editing], FormPhase::Editing)?;
        Ok(self.control.as_mut().map_or(0, |c| c.bulk_fill(target)))
    }

    /// Tracked fields whose default-language value is blank.
    pub fn missing_required_fields(&self) -> Vec<String> {
        let Some(control) = &self.control else {
            return Vec::new();
        };
        let required = [control.default_language()];
        control
            .fields()
            .iter()
            .filter(|(_, value)| !validate_translations(value, &required).is_valid)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Any tracked field differs from what was loaded.
    pub fn has_changes(&self) -> bool {
        let Some(control) = &self.control else {
            return false;
        };
        control.fields().iter().any(|(key, current)| {
            self.original
                .get(key)
                .map_or(true, |original| has_translation_changes(original, current))
        })
    }

    /// Text to show for `field` in `code` outside the edit tabs.
    pub fn display_value(&self, field: &str, code: &str) -> &str {
        self.control
            .as_ref()
            .map_or("", |control| control.display_value(field, code))
    }

    /// Default-language value of a tracked field, for the base-entity save.
    pub fn default_value(&self, field: &str) -> Option<&str> {
        let control = self.control.as_ref()?;
        control
            .field(field)
            .map(|v| v.value_or_empty(control.default_language()))
    }

    pub fn build_batch(&self, entity_id: i64) -> BatchUpsertRequest {
        match &self.control {
            Some(control) => BatchUpsertRequest::from_fields(
                self.entity,
                entity_id,
                control.fields(),
                control.languages(),
            ),
            None => BatchUpsertRequest::default(),
        }
    }

    pub fn begin_submit(&mut self) -> Result<(), SessionError> {
        self.transition(&[FormPhase::Populated, FormPhase::Editing], FormPhase::Submitting)
    }

    /// Base save failed: back to editing with the API's field errors mapped
    /// onto tracked fields.
    pub fn submit_failed(&mut self, err: &ApiError) -> Result<(), SessionError> {
        self.transition(&[FormPhase::Submitting], FormPhase::Editing)?;
        self.apply_field_errors(err);
        Ok(())
    }

    /// Base save succeeded; the form closes whatever happens to translations.
    pub fn close(&mut self, entity_id: Option<i64>) -> Result<(), SessionError> {
        self.transition(&[FormPhase::Submitting], FormPhase::Closed)?;
        if entity_id.is_some() {
            self.entity_id = entity_id;
        }
        info!(entity = %self.entity, entity_id = ?self.entity_id, "translation form closed");
        Ok(())
    }

    /// Map validation field names (e.g. `Name`, `translations[1].description`)
    /// onto tracked field keys, case-insensitively. Returns how many matched.
    pub fn apply_field_errors(&mut self, err: &ApiError) -> usize {
        self.field_errors.clear();
        let (Some(errors), Some(control)) = (err.field_errors(), &self.control) else {
            return 0;
        };
        for (api_field, messages) in errors {
            let leaf = api_field.rsplit('.').next().unwrap_or(api_field);
            if let Some(key) = control
                .fields()
                .keys()
                .find(|k| k.eq_ignore_ascii_case(leaf))
            {
                self.field_errors
                    .entry(key.clone())
                    .or_default()
                    .extend(messages.iter().cloned());
            }
        }
        self.field_errors.len()
    }
}
