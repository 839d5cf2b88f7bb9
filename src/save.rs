//! Entity save followed by a best-effort translation save.
//!
//! The base entity is saved first. Its failure is fatal to the submit and
//! keeps the form open. Only after it commits is the translation batch sent;
//! a translation failure is logged and reported in the outcome but never
//! undoes or blocks the base save.

use std::future::Future;

use tracing::{info, warn};

use crate::api::Transport;
use crate::error::ApiError;
use crate::session::{SessionError, TranslationFormSession};
use crate::translation::{TranslationRecord, TranslationService};

/// Result of [`save_with_translations`].
#[derive(Debug)]
pub struct SaveOutcome<E> {
    pub base: Result<E, ApiError>,
    /// `None` when the translation save was not attempted (base save failed).
    pub translations: Option<Result<Vec<TranslationRecord>, ApiError>>,
}

impl<E> SaveOutcome<E> {
    /// The submit succeeded from the user's point of view.
    pub fn is_success(&self) -> bool {
        self.base.is_ok()
    }

    pub fn translation_error(&self) -> Option<&ApiError> {
        self.translations.as_ref().and_then(|r| r.as_ref().err())
    }
}

/// Run the submit sequence for an open form.
///
/// `base_save` persists the entity (and with it the default-language
/// values); `entity_id_of` extracts the id needed for the translation
/// records, which for a create form only exists after the base save.
pub async fn save_with_translations<T, E, F, Fut>(
    service: &TranslationService<'_, T>,
    session: &mut TranslationFormSession,
    base_save: F,
    entity_id_of: impl FnOnce(&E) -> i64,
) -> Result<SaveOutcome<E>, SessionError>
where
    T: Transport,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<E, ApiError>>,
{
    session.begin_submit()?;

    let entity = match base_save().await {
        Ok(entity) => entity,
        Err(err) => {
            warn!(entity = %session.entity(), error = %err, "base entity save failed");
            session.submit_failed(&err)?;
            return Ok(SaveOutcome {
                base: Err(err),
                translations: None,
            });
        }
    };

    let entity_id = entity_id_of(&entity);
    let batch = session.build_batch(entity_id);
    let translations = match service.batch_upsert_translations(&batch).await {
        Ok(saved) => Ok(saved),
        Err(err) => {
            warn!(
                entity = %session.entity(),
                entity_id,
                records = batch.len(),
                error = %err,
                "translation save failed; base entity was saved"
            );
            Err(err)
        }
    };

    session.close(Some(entity_id))?;
    info!(
        entity = %session.entity(),
        entity_id,
        translations_ok = translations.is_ok(),
        "entity saved"
    );
    Ok(SaveOutcome {
        base: Ok(entity),
        translations: Some(translations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchContext;
    use crate::session::FormPhase;
    use crate::test_utils::{en_tr, FakeTransport};
    use crate::translation::{TranslationEntity, TranslationFetchResult};
    use indexmap::IndexMap;
    use reqwest::Method;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Product {
        id: i64,
        name: String,
    }

    fn populated(entity_id: Option<i64>) -> TranslationFormSession {
        let mut session = TranslationFormSession::new(TranslationEntity::Product, entity_id);
        session.languages_loaded(en_tr()).unwrap();
        let mut base = IndexMap::new();
        base.insert("name".to_string(), "Burger".to_string());
        session
            .apply_fetch(Ok(TranslationFetchResult::Flat(vec![])), &base)
            .unwrap();
        session
    }

    fn service(transport: &FakeTransport) -> TranslationService<'_, FakeTransport> {
        TranslationService::new(transport, TranslationEntity::Product, BranchContext::default())
    }

    #[tokio::test]
    async fn optional_language_left_blank_saves_without_batch() {
        let transport = FakeTransport::new();
        let mut session = populated(Some(3));

        let outcome = save_with_translations(
            &service(&transport),
            &mut session,
            || async { Ok(Product { id: 3, name: "Burger".into() }) },
            |p: &Product| p.id,
        )
        .await
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.translations.unwrap().unwrap().len(), 0);
        assert!(transport.requests().is_empty());
        assert_eq!(session.phase(), FormPhase::Closed);
    }

    #[tokio::test]
    async fn create_form_uses_id_from_base_save() {
        let transport = FakeTransport::new();
        transport.push_ok(json!([{ "productId": 41, "languageCode": "tr", "name": "Hamburger" }]));
        let mut session = populated(None);
        session.edit("name", "tr", "Hamburger").unwrap();

        let outcome = save_with_translations(
            &service(&transport),
            &mut session,
            || async { Ok(Product { id: 41, name: "Burger".into() }) },
            |p: &Product| p.id,
        )
        .await
        .unwrap();

        assert_eq!(outcome.translations.unwrap().unwrap().len(), 1);
        assert_eq!(session.entity_id(), Some(41));
        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(
            sent[0].body,
            Some(json!({ "translations": [
                { "productId": 41, "languageCode": "tr", "name": "Hamburger" }
            ]}))
        );
    }

    #[tokio::test]
    async fn translation_failure_does_not_fail_the_save() {
        let transport = FakeTransport::new();
        transport.push_err(ApiError::Connectivity("offline".into()));
        let mut session = populated(Some(3));
        session.edit("name", "tr", "Hamburger").unwrap();

        let outcome = save_with_translations(
            &service(&transport),
            &mut session,
            || async { Ok(Product { id: 3, name: "Burger".into() }) },
            |p: &Product| p.id,
        )
        .await
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.base.as_ref().unwrap().name, "Burger");
        assert!(outcome.translation_error().unwrap().is_connectivity());
        assert_eq!(session.phase(), FormPhase::Closed);
    }

    #[tokio::test]
    async fn base_failure_skips_translations_and_keeps_form_open() {
        let transport = FakeTransport::new();
        let mut session = populated(Some(3));
        session.edit("name", "tr", "Hamburger").unwrap();

        let outcome = save_with_translations(
            &service(&transport),
            &mut session,
            || async {
                Err::<Product, _>(ApiError::from_status(
                    reqwest::StatusCode::BAD_REQUEST,
                    r#"{"errors":{"Name":["Already exists"]}}"#,
                ))
            },
            |p: &Product| p.id,
        )
        .await
        .unwrap();

        assert!(!outcome.is_success());
        assert!(outcome.translations.is_none());
        assert!(transport.requests().is_empty());
        assert_eq!(session.phase(), FormPhase::Editing);
        assert_eq!(session.field_errors()["name"], vec!["Already exists"]);
    }

    #[tokio::test]
    async fn submit_requires_populated_form() {
        let transport = FakeTransport::new();
        let mut session = TranslationFormSession::new(TranslationEntity::Product, Some(1));

        let result = save_with_translations(
            &service(&transport),
            &mut session,
            || async { Ok(Product { id: 1, name: "x".into() }) },
            |p: &Product| p.id,
        )
        .await;
        assert!(matches!(result, Err(SessionError::InvalidTransition { .. })));
    }
}
