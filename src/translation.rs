//! Translation endpoints.
//!
//! Every translatable entity kind (branch, category, product, ...) has its
//! own `/api/<kind>-translations` resource with the same four operations.
//! [`TranslationService`] covers all of them; [`TranslationEntity`] carries
//! the per-kind differences (resource path, id field, tracked fields).

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::{ApiRequest, Transport};
use crate::branch::BranchContext;
use crate::error::ApiError;
use crate::languages::RestaurantLanguages;
use crate::translatable::{translations_to_object, TranslatableFieldValue};

/// Keys of a wire record that are bookkeeping, not translated fields.
const RECORD_META_KEYS: &[&str] = &["id", "languageCode", "createdAt", "updatedAt"];

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationEntity {
    Branch,
    BranchCategory,
    Category,
    Product,
    TableCategory,
    Contact,
}

impl TranslationEntity {
    pub const ALL: [TranslationEntity; 6] = [
        TranslationEntity::Branch,
        TranslationEntity::BranchCategory,
        TranslationEntity::Category,
        TranslationEntity::Product,
        TranslationEntity::TableCategory,
        TranslationEntity::Contact,
    ];

    /// Resource path without trailing slash.
    pub fn resource(&self) -> &'static str {
        match self {
            TranslationEntity::Branch => "/api/branch-translations",
            TranslationEntity::BranchCategory => "/api/branch-category-translations",
            TranslationEntity::Category => "/api/category-translations",
            TranslationEntity::Product => "/api/product-translations",
            TranslationEntity::TableCategory => "/api/table-category-translations",
            TranslationEntity::Contact => "/api/contact-translations",
        }
    }

    /// Name of the entity id property in wire records.
    pub fn id_field(&self) -> &'static str {
        match self {
            TranslationEntity::Branch => "branchId",
            TranslationEntity::BranchCategory => "branchCategoryId",
            TranslationEntity::Category => "categoryId",
            TranslationEntity::Product => "productId",
            TranslationEntity::TableCategory => "tableCategoryId",
            TranslationEntity::Contact => "contactId",
        }
    }

    /// Translatable fields, in form order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            TranslationEntity::Branch => &["name", "description"],
            TranslationEntity::BranchCategory => &["displayName", "description"],
            TranslationEntity::Category => &["categoryName", "description"],
            TranslationEntity::Product => &["name", "description"],
            TranslationEntity::TableCategory => &["categoryName", "description"],
            TranslationEntity::Contact => {
                &["headerTitle", "headerSubtitle", "contactTitle", "formTitle"]
            }
        }
    }
}

impl fmt::Display for TranslationEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TranslationEntity::Branch => "branch",
            TranslationEntity::BranchCategory => "branch-category",
            TranslationEntity::Category => "category",
            TranslationEntity::Product => "product",
            TranslationEntity::TableCategory => "table-category",
            TranslationEntity::Contact => "contact",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// One entity's translated fields in one language.
///
/// Serialises to `{ <idField>: id, languageCode, <field>: value, ... }`.
/// A `None` field is left out of the JSON, which the API reads as "no change".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub id_field: String,
    pub entity_id: i64,
    pub language_code: String,
    fields: IndexMap<String, Option<String>>,
}

impl TranslationRecord {
    pub fn new(id_field: &str, entity_id: i64, language_code: &str) -> Self {
        Self {
            id_field: id_field.to_string(),
            entity_id,
            language_code: language_code.to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Value of `name`; `None` when absent or explicitly unset.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn set_field<V: Into<String>>(&mut self, name: &str, value: Option<V>) {
        self.fields.insert(name.to_string(), value.map(Into::into));
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// `true` when at least one field carries a non-blank value.
    pub fn has_values(&self) -> bool {
        self.fields
            .values()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Parse a record returned by the API. Scalars other than strings are
    /// stringified; `null` fields are kept as unset.
    pub fn from_value(value: &Value, id_field: &str) -> Result<Self, ApiError> {
        Self::from_value_for(value, id_field, None)
    }

    /// Like [`Self::from_value`], but a record without `id_field` takes
    /// `entity_id` (the id the records were fetched for).
    pub fn from_value_for(
        value: &Value,
        id_field: &str,
        entity_id: Option<i64>,
    ) -> Result<Self, ApiError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ApiError::invalid_response("translation record is not an object"))?;

        let language_code = obj
            .get("languageCode")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::invalid_response("translation record has no languageCode"))?;

        let entity_id = match obj.get(id_field) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => entity_id,
        }
        .ok_or_else(|| {
            ApiError::invalid_response(format!("translation record has no {id_field}"))
        })?;

        let mut record = Self::new(id_field, entity_id, language_code);
        for (key, v) in obj {
            if key == id_field || RECORD_META_KEYS.contains(&key.as_str()) {
                continue;
            }
            match v {
                Value::String(s) => record.set_field(key, Some(s.as_str())),
                Value::Number(n) => record.set_field(key, Some(n.to_string())),
                Value::Bool(b) => record.set_field(key, Some(b.to_string())),
                Value::Null => record.set_field::<String>(key, None),
                Value::Array(_) | Value::Object(_) => {}
            }
        }
        Ok(record)
    }
}

impl Serialize for TranslationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(&self.id_field, &self.entity_id)?;
        map.serialize_entry("languageCode", &self.language_code)?;
        for (name, value) in &self.fields {
            if let Some(value) = value {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Fetch result
// ---------------------------------------------------------------------------

/// `GET /api/<kind>-translations/{id}` answers either a bare array of records
/// or `{ baseValues, translations }` depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationFetchResult {
    Flat(Vec<TranslationRecord>),
    Wrapped {
        /// The entity's own (default-language) field values.
        base_values: IndexMap<String, String>,
        translations: Vec<TranslationRecord>,
    },
}

impl TranslationFetchResult {
    pub fn parse(value: &Value, entity: TranslationEntity) -> Result<Self, ApiError> {
        Self::parse_for(value, entity, None)
    }

    /// Parse the answer for one entity; records that omit the id field are
    /// attributed to `entity_id`.
    pub fn parse_for(
        value: &Value,
        entity: TranslationEntity,
        entity_id: Option<i64>,
    ) -> Result<Self, ApiError> {
        match value {
            Value::Null => Ok(Self::Flat(Vec::new())),
            Value::Array(items) => Ok(Self::Flat(parse_records(items, entity, entity_id)?)),
            Value::Object(obj) if obj.contains_key("translations") => {
                let items = obj
                    .get("translations")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let base_values = obj
                    .get("baseValues")
                    .and_then(Value::as_object)
                    .map(scalar_fields)
                    .unwrap_or_default();
                Ok(Self::Wrapped {
                    base_values,
                    translations: parse_records(items, entity, entity_id)?,
                })
            }
            _ => Err(ApiError::invalid_response(format!(
                "unexpected {entity} translations payload"
            ))),
        }
    }

    pub fn translations(&self) -> &[TranslationRecord] {
        match self {
            Self::Flat(records) => records,
            Self::Wrapped { translations, .. } => translations,
        }
    }

    pub fn base_values(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Flat(_) => None,
            Self::Wrapped { base_values, .. } => Some(base_values),
        }
    }

    /// Per-language values of one field.
    pub fn field_values(&self, field_name: &str) -> TranslatableFieldValue {
        translations_to_object(self.translations(), field_name)
    }
}

fn parse_records(
    items: &[Value],
    entity: TranslationEntity,
    entity_id: Option<i64>,
) -> Result<Vec<TranslationRecord>, ApiError> {
    items
        .iter()
        .map(|item| TranslationRecord::from_value_for(item, entity.id_field(), entity_id))
        .collect()
}

fn scalar_fields(obj: &Map<String, Value>) -> IndexMap<String, String> {
    obj.iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k.clone(), s.clone())),
            Value::Number(n) => Some((k.clone(), n.to_string())),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Batch payload
// ---------------------------------------------------------------------------

/// Body of `PUT /api/<kind>-translations/batch`.
///
/// Only holds records for non-default languages with at least one non-blank
/// field. The default language is saved with the entity itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchUpsertRequest {
    translations: Vec<TranslationRecord>,
}

impl BatchUpsertRequest {
    /// One record per non-default language, in restaurant-language order.
    pub fn from_fields(
        entity: TranslationEntity,
        entity_id: i64,
        fields: &IndexMap<String, TranslatableFieldValue>,
        languages: &RestaurantLanguages,
    ) -> Self {
        let records = languages.translation_codes().into_iter().map(|code| {
            let mut record = TranslationRecord::new(entity.id_field(), entity_id, code);
            for (name, values) in fields {
                let value = values.get(code).filter(|v| !v.trim().is_empty());
                record.set_field(name, value);
            }
            record
        });
        Self::from_records(records, languages)
    }

    /// Keep the records the batch endpoint accepts: default-language,
    /// unknown-language and all-blank records are dropped.
    pub fn from_records(
        records: impl IntoIterator<Item = TranslationRecord>,
        languages: &RestaurantLanguages,
    ) -> Self {
        let translations = records
            .into_iter()
            .filter(|record| {
                let code = record.language_code.as_str();
                !languages.is_default(code)
                    && languages.find(code).is_some()
                    && record.has_values()
            })
            .collect();
        Self { translations }
    }

    pub fn translations(&self) -> &[TranslationRecord] {
        &self.translations
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct TranslationService<'a, T> {
    transport: &'a T,
    entity: TranslationEntity,
    branch: BranchContext,
}

impl<'a, T: Transport> TranslationService<'a, T> {
    pub fn new(transport: &'a T, entity: TranslationEntity, branch: BranchContext) -> Self {
        Self {
            transport,
            entity,
            branch,
        }
    }

    pub fn entity(&self) -> TranslationEntity {
        self.entity
    }

    /// `GET /api/<kind>-translations/{id}`
    pub async fn get_translations(
        &self,
        entity_id: i64,
    ) -> Result<TranslationFetchResult, ApiError> {
        let path = format!("{}/{entity_id}", self.entity.resource());
        let resp = self
            .transport
            .execute(self.branch.apply(ApiRequest::get(path)))
            .await?;
        let result = TranslationFetchResult::parse_for(&resp, self.entity, Some(entity_id))?;
        debug!(
            entity = %self.entity,
            entity_id,
            records = result.translations().len(),
            "translations fetched"
        );
        Ok(result)
    }

    /// `PUT /api/<kind>-translations`
    pub async fn upsert_translation(
        &self,
        record: &TranslationRecord,
    ) -> Result<TranslationRecord, ApiError> {
        validate_language_code(&record.language_code)?;
        let body = serde_json::to_value(record).map_err(ApiError::invalid_response)?;
        let resp = self
            .transport
            .execute(
                self.branch
                    .apply(ApiRequest::put(self.entity.resource()).json(body)),
            )
            .await?;
        if resp.is_null() {
            return Ok(record.clone());
        }
        TranslationRecord::from_value(&resp, self.entity.id_field())
    }

    /// `PUT /api/<kind>-translations/batch`. An empty batch is not sent.
    pub async fn batch_upsert_translations(
        &self,
        request: &BatchUpsertRequest,
    ) -> Result<Vec<TranslationRecord>, ApiError> {
        if request.is_empty() {
            debug!(entity = %self.entity, "empty translation batch, nothing to send");
            return Ok(Vec::new());
        }
        for record in &request.translations {
            validate_language_code(&record.language_code)?;
        }

        let body = serde_json::to_value(request).map_err(ApiError::invalid_response)?;
        let path = format!("{}/batch", self.entity.resource());
        let resp = self
            .transport
            .execute(self.branch.apply(ApiRequest::put(path).json(body)))
            .await?;

        let saved = match &resp {
            Value::Null => request.translations.clone(),
            Value::Array(items) => parse_records(items, self.entity, None)?,
            Value::Object(obj) => match obj.get("translations").and_then(Value::as_array) {
                Some(items) => parse_records(items, self.entity, None)?,
                None => request.translations.clone(),
            },
            _ => return Err(ApiError::invalid_response("unexpected batch upsert payload")),
        };
        info!(
            entity = %self.entity,
            records = saved.len(),
            "translation batch saved"
        );
        Ok(saved)
    }

    /// `DELETE /api/<kind>-translations/{id}/{languageCode}`
    pub async fn delete_translation(
        &self,
        entity_id: i64,
        language_code: &str,
    ) -> Result<(), ApiError> {
        let code = validate_language_code(language_code)?;
        let path = format!("{}/{entity_id}/{code}", self.entity.resource());
        self.transport
            .execute(self.branch.apply(ApiRequest::delete(path)))
            .await?;
        info!(entity = %self.entity, entity_id, language = %code, "translation deleted");
        Ok(())
    }
}

/// Language codes end up in URL paths; only `[A-Za-z0-9_-]` is accepted.
fn validate_language_code(code: &str) -> Result<&str, ApiError> {
    let trimmed = code.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 16
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(trimmed)
    } else {
        Err(ApiError::Validation {
            message: format!("Invalid language code: {code:?}"),
            field_errors: IndexMap::new(),
        })
    }
}
