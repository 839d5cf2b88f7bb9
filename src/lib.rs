//! The Small Back Office - catalogue translation layer
//!
//! Typed client for the restaurant back-office's multi-language data: the
//! per-field, per-language value model, the translation endpoints of every
//! translatable entity kind, the state behind the multi-language form
//! controls, and the submit sequence that saves an entity and then, on a
//! best-effort basis, its translations.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use indexmap::IndexMap;
//! use the_small_backoffice::{
//!     ClientConfig, HttpTransport, LanguageService, TranslationEntity,
//!     TranslationFormSession, TranslationService,
//! };
//!
//! let config = ClientConfig::from_env()?;
//! let transport = HttpTransport::new(&config)?;
//! let branch = config.branch_context();
//!
//! let languages = LanguageService::new(&transport)
//!     .restaurant_languages(&branch)
//!     .await?;
//! let service = TranslationService::new(&transport, TranslationEntity::Product, branch);
//!
//! let mut session = TranslationFormSession::new(TranslationEntity::Product, Some(12))
//!     .with_fallback_languages(config.fallback_languages());
//! session.languages_loaded(languages)?;
//! let mut base = IndexMap::new();
//! base.insert("name".to_string(), "Burger".to_string());
//! session.load(&service, &base).await?;
//! session.edit("name", "tr", "Hamburger")?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod branch;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod form;
pub mod languages;
pub mod save;
pub mod session;
pub mod storage;
pub mod translatable;
pub mod translation;

#[cfg(test)]
mod test_utils;

pub use api::{normalize_base_url, ApiRequest, HttpTransport, Transport};
pub use branch::BranchContext;
pub use config::{ClientConfig, ConfigError, LogConfig};
pub use diagnostics::init_logging;
pub use error::ApiError;
pub use form::{Completion, InputKind, LanguageFormControl, LanguageTab, MultiLanguageInput};
pub use languages::{Language, LanguageService, RestaurantLanguages};
pub use save::{save_with_translations, SaveOutcome};
pub use session::{FormPhase, SessionError, TranslationFormSession};
pub use storage::{CredentialStore, KeyringStore, MemoryStore};
pub use translatable::{
    empty_translations, has_translation_changes, merge_translations, object_to_translations,
    translation_with_fallback, translations_to_object, validate_translations,
    TranslatableFieldValue, TranslationValidation, DEFAULT_FALLBACK_LANGUAGES,
};
pub use translation::{
    BatchUpsertRequest, TranslationEntity, TranslationFetchResult, TranslationRecord,
    TranslationService,
};
