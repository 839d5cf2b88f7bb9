//! End-to-end product edit form against a scripted back-office.

use std::collections::VecDeque;
use std::sync::Mutex;

use indexmap::IndexMap;
use serde_json::{json, Value};
use the_small_backoffice::{
    save_with_translations, ApiError, ApiRequest, BranchContext, FormPhase, InputKind,
    LanguageService, MultiLanguageInput, TranslationEntity, TranslationFormSession,
    TranslationService, Transport,
};

#[derive(Default)]
struct ScriptedBackOffice {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedBackOffice {
    fn reply(&self, response: Result<Value, ApiError>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    fn last_body(&self) -> Option<Value> {
        self.requests.lock().unwrap().last().and_then(|r| r.body.clone())
    }
}

impl Transport for ScriptedBackOffice {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

fn restaurant_languages() -> Value {
    json!({
        "availableLanguages": [
            { "code": "en", "displayName": "English", "nativeName": "English" },
            { "code": "tr", "displayName": "Turkish", "nativeName": "Türkçe" }
        ],
        "defaultLanguage": "en"
    })
}

fn burger() -> IndexMap<String, String> {
    let mut base = IndexMap::new();
    base.insert("name".to_string(), "Burger".to_string());
    base.insert("description".to_string(), "Beef patty".to_string());
    base
}

async fn open_form(backoffice: &ScriptedBackOffice) -> TranslationFormSession {
    let branch = BranchContext::for_branch(1);
    let mut session = TranslationFormSession::new(TranslationEntity::Product, Some(12));

    session.begin_loading_languages().unwrap();
    let languages = LanguageService::new(backoffice)
        .restaurant_languages(&branch)
        .await
        .expect("languages");
    session.languages_loaded(languages).unwrap();

    let service = TranslationService::new(backoffice, TranslationEntity::Product, branch);
    session.load(&service, &burger()).await.unwrap();
    session
}

#[tokio::test]
async fn untouched_optional_language_is_not_sent() {
    let backoffice = ScriptedBackOffice::default();
    backoffice
        .reply(Ok(restaurant_languages()))
        .reply(Ok(json!([])));

    let mut session = open_form(&backoffice).await;
    let name = session.control().unwrap().field("name").unwrap().clone();
    assert_eq!(name.get("en"), Some("Burger"));
    assert_eq!(name.get("tr"), Some(""));

    let input = MultiLanguageInput::new(
        session.control().unwrap().languages().languages().to_vec(),
        InputKind::SingleLine,
    )
    .required(true);
    let tabs = input.tabs(&name);
    assert!(!tabs[1].required && !tabs[1].has_error);

    let branch = BranchContext::for_branch(1);
    let service = TranslationService::new(&backoffice, TranslationEntity::Product, branch);
    let outcome = save_with_translations(
        &service,
        &mut session,
        || async { Ok::<_, ApiError>(12_i64) },
        |id| *id,
    )
    .await
    .unwrap();

    assert!(outcome.is_success());
    assert_eq!(session.phase(), FormPhase::Closed);
    assert_eq!(
        backoffice.paths(),
        vec![
            "GET /api/Languages/restaurant",
            "GET /api/product-translations/12"
        ]
    );
}

#[tokio::test]
async fn bulk_fill_overwrites_and_is_saved() {
    let backoffice = ScriptedBackOffice::default();
    backoffice
        .reply(Ok(restaurant_languages()))
        .reply(Ok(json!([])));

    let mut session = open_form(&backoffice).await;
    session.edit("name", "tr", "Hamburger").unwrap();
    assert_eq!(session.bulk_fill("tr").unwrap(), 2);

    let branch = BranchContext::for_branch(1);
    let service = TranslationService::new(&backoffice, TranslationEntity::Product, branch);
    save_with_translations(
        &service,
        &mut session,
        || async { Ok::<_, ApiError>(12_i64) },
        |id| *id,
    )
    .await
    .unwrap();

    assert_eq!(
        backoffice.last_body(),
        Some(json!({ "translations": [{
            "productId": 12, "languageCode": "tr",
            "name": "Burger", "description": "Beef patty"
        }]}))
    );
}

#[tokio::test]
async fn missing_translations_endpoint_degrades_to_base_values() {
    let backoffice = ScriptedBackOffice::default();
    backoffice
        .reply(Ok(restaurant_languages()))
        .reply(Err(ApiError::NotFound("no translations".into())));

    let session = open_form(&backoffice).await;
    assert_eq!(session.phase(), FormPhase::Populated);

    let control = session.control().unwrap();
    assert_eq!(control.field("name").unwrap().get("en"), Some("Burger"));
    assert_eq!(control.field("name").unwrap().get("tr"), Some(""));
    assert_eq!(control.field("description").unwrap().get("tr"), Some(""));
    assert!(!session.has_changes());
}
