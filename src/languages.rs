//! Restaurant languages.
//!
//! A restaurant exposes an ordered list of languages plus one default
//! language. The default language's values are canonical and saved with the
//! entity itself; every other language is an optional overlay saved through
//! the translation endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiRequest, Transport};
use crate::branch::BranchContext;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub native_name: String,
    #[serde(default)]
    pub is_rtl: bool,
}

impl Language {
    pub fn new(code: &str, display_name: &str, native_name: &str) -> Self {
        Self {
            code: code.to_string(),
            display_name: display_name.to_string(),
            native_name: native_name.to_string(),
            is_rtl: false,
        }
    }

    /// Tab label: native name, then display name, then the upper-cased code.
    pub fn label(&self) -> String {
        [&self.native_name, &self.display_name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| self.code.to_uppercase())
    }
}

/// The languages configured for one restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantLanguages {
    languages: Vec<Language>,
    default_language: String,
}

impl RestaurantLanguages {
    /// `None` when `languages` is empty. A default outside the list is
    /// prepended as a bare descriptor so it always has a tab.
    pub fn new(mut languages: Vec<Language>, default_language: &str) -> Option<Self> {
        let default_language = default_language.trim();
        let default_language = if default_language.is_empty() {
            languages.first()?.code.clone()
        } else {
            default_language.to_string()
        };
        if !languages.iter().any(|l| l.code == default_language) {
            languages.insert(
                0,
                Language::new(&default_language, &default_language.to_uppercase(), ""),
            );
        }
        Some(Self {
            languages,
            default_language,
        })
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn is_default(&self, code: &str) -> bool {
        self.default_language == code
    }

    pub fn codes(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.code.as_str()).collect()
    }

    /// Codes that go through the translation endpoints, in list order.
    pub fn translation_codes(&self) -> Vec<&str> {
        self.languages
            .iter()
            .map(|l| l.code.as_str())
            .filter(|c| !self.is_default(c))
            .collect()
    }

    pub fn find(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct LanguageService<'a, T> {
    transport: &'a T,
}

impl<'a, T: Transport> LanguageService<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// `GET /api/Languages`: every language the platform supports.
    pub async fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        let resp = self
            .transport
            .execute(ApiRequest::get("/api/Languages"))
            .await?;
        let list = if resp.is_array() {
            resp
        } else {
            resp.get("languages")
                .or_else(|| resp.get("data"))
                .cloned()
                .unwrap_or(Value::Array(Vec::new()))
        };
        serde_json::from_value(list).map_err(ApiError::invalid_response)
    }

    /// `GET /api/Languages/restaurant`: the restaurant's languages and default.
    pub async fn restaurant_languages(
        &self,
        branch: &BranchContext,
    ) -> Result<RestaurantLanguages, ApiError> {
        let request = branch.apply(ApiRequest::get("/api/Languages/restaurant"));
        let resp = self.transport.execute(request).await?;
        let parsed = parse_restaurant_languages(&resp)?;
        debug!(
            languages = ?parsed.codes(),
            default_language = %parsed.default_language(),
            "restaurant languages loaded"
        );
        Ok(parsed)
    }
}

fn parse_restaurant_languages(resp: &Value) -> Result<RestaurantLanguages, ApiError> {
    let list = ["availableLanguages", "languages", "supportedLanguages"]
        .iter()
        .find_map(|key| resp.get(*key))
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    let languages: Vec<Language> =
        serde_json::from_value(list).map_err(ApiError::invalid_response)?;

    let default_language = match resp.get("defaultLanguage") {
        Some(Value::String(code)) => code.clone(),
        Some(obj @ Value::Object(_)) => obj
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };

    RestaurantLanguages::new(languages, &default_language)
        .ok_or_else(|| ApiError::invalid_response("restaurant has no languages configured"))
}
