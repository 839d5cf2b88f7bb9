//! Error taxonomy for back-office API calls.

use indexmap::IndexMap;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the translation and language services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 400. `field_errors` is keyed by the field name the API reported.
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: IndexMap<String, Vec<String>>,
    },
    /// HTTP 401. The caller should send the user back to the login screen.
    #[error("Session expired, please sign in again")]
    SessionExpired,
    /// HTTP 403.
    #[error("You do not have permission to perform this action")]
    PermissionDenied,
    /// HTTP 404.
    #[error("{0}")]
    NotFound(String),
    /// Network failure, timeout or offline.
    #[error("{0}")]
    Connectivity(String),
    #[error("{message}")]
    Unknown {
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    /// Map a non-success HTTP response onto the taxonomy.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let json = serde_json::from_str::<Value>(body).ok();
        let server_message = json.as_ref().and_then(server_message);

        match status.as_u16() {
            400 => {
                let field_errors = json.as_ref().map(parse_field_errors).unwrap_or_default();
                let message = if field_errors.is_empty() {
                    server_message.unwrap_or_else(|| "Validation failed".to_string())
                } else {
                    field_errors
                        .iter()
                        .map(|(field, messages)| {
                            if field.is_empty() {
                                messages.join(", ")
                            } else {
                                format!("{field}: {}", messages.join(", "))
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                ApiError::Validation {
                    message,
                    field_errors,
                }
            }
            401 => ApiError::SessionExpired,
            403 => ApiError::PermissionDenied,
            404 => ApiError::NotFound(
                server_message.unwrap_or_else(|| "Requested resource was not found".to_string()),
            ),
            s => {
                let message = server_message
                    .or_else(|| {
                        let trimmed = body.trim();
                        (!trimmed.is_empty()).then(|| trimmed.to_string())
                    })
                    .unwrap_or_else(|| {
                        if s >= 500 {
                            format!("Back-office server error (HTTP {s})")
                        } else {
                            format!("Unexpected response from back-office API (HTTP {s})")
                        }
                    });
                ApiError::Unknown {
                    status: Some(s),
                    message,
                }
            }
        }
    }

    /// Convert a `reqwest::Error` raised before a response was received.
    pub fn from_transport(url: &str, err: &reqwest::Error) -> Self {
        if err.is_connect() {
            return ApiError::Connectivity(format!("Cannot reach back-office API at {url}"));
        }
        if err.is_timeout() {
            return ApiError::Connectivity(format!("Connection to {url} timed out"));
        }
        if err.is_request() {
            return ApiError::Connectivity(format!(
                "Network error communicating with {url}: {err}"
            ));
        }
        if err.is_builder() {
            return ApiError::Unknown {
                status: None,
                message: format!("Invalid back-office API URL: {url}"),
            };
        }
        ApiError::Unknown {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// A response body that could not be interpreted.
    pub fn invalid_response(detail: impl std::fmt::Display) -> Self {
        ApiError::Unknown {
            status: None,
            message: format!("Invalid response from back-office API: {detail}"),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity(_))
    }

    /// Field-level messages of a validation error, if the API reported any.
    pub fn field_errors(&self) -> Option<&IndexMap<String, Vec<String>>> {
        match self {
            ApiError::Validation { field_errors, .. } if !field_errors.is_empty() => {
                Some(field_errors)
            }
            _ => None,
        }
    }
}

fn server_message(json: &Value) -> Option<String> {
    ["message", "title", "error", "detail"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Accepts the three shapes the API has been seen to use:
/// `{"errors": {"Name": ["..."]}}`, `{"errors": ["..."]}` and
/// `{"errors": [{"field": "Name", "message": "..."}]}`.
fn parse_field_errors(json: &Value) -> IndexMap<String, Vec<String>> {
    let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
    let Some(errors) = json.get("errors") else {
        return out;
    };

    match errors {
        Value::Object(map) => {
            for (field, messages) in map {
                let collected: Vec<String> = match messages {
                    Value::Array(arr) => arr
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToString::to_string)
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => vec![],
                };
                if !collected.is_empty() {
                    out.insert(field.clone(), collected);
                }
            }
        }
        Value::Array(arr) => {
            for entry in arr {
                match entry {
                    Value::String(s) => out.entry(String::new()).or_default().push(s.clone()),
                    Value::Object(_) => {
                        let field = ["field", "propertyName", "name"]
                            .iter()
                            .find_map(|k| entry.get(*k).and_then(Value::as_str))
                            .unwrap_or("")
                            .to_string();
                        if let Some(message) = ["message", "errorMessage"]
                            .iter()
                            .find_map(|k| entry.get(*k).and_then(Value::as_str))
                        {
                            out.entry(field).or_default().push(message.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_built_from_field_errors() {
        let body = r#"{"title":"One or more validation errors occurred.",
                       "errors":{"Name":["The Name field is required."],
                                 "Price":["Must be positive.","Too large."]}}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Name: The Name field is required.; Price: Must be positive., Too large."
        );
        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["Price"].len(), 2);
    }

    #[test]
    fn validation_accepts_list_of_objects() {
        let body = r#"{"errors":[{"propertyName":"description","errorMessage":"Too long"}]}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.field_errors().unwrap()["description"], vec!["Too long"]);
    }

    #[test]
    fn validation_without_details_uses_server_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"Bad language"}"#);
        assert_eq!(err.to_string(), "Bad language");
        assert!(err.field_errors().is_none());

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(err.to_string(), "Validation failed");
    }

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_session_expired());
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::PermissionDenied
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn unknown_status_preserves_server_message() {
        let err = ApiError::from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"database unavailable"}"#,
        );
        match err {
            ApiError::Unknown { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "database unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = ApiError::from_status(StatusCode::CONFLICT, "row version mismatch");
        assert_eq!(err.to_string(), "row version mismatch");

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.to_string(), "Back-office server error (HTTP 502)");
    }
}
