//! Back-office API transport.
//!
//! Provides authenticated HTTP communication with the restaurant back-office
//! REST API. Services talk to it through the [`Transport`] trait so they can
//! be exercised without a network.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Canonical form of a back-office base URL: scheme added when missing
/// (`http` for local hosts, `https` otherwise), no trailing slash and no
/// trailing `/api` segment. Blank input stays blank.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    let with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if is_local_host(url) {
        format!("http://{url}")
    } else {
        format!("https://{url}")
    };

    let without_slash = with_scheme.trim_end_matches('/');
    without_slash
        .strip_suffix("/api")
        .unwrap_or(without_slash)
        .trim_end_matches('/')
        .to_string()
}

fn is_local_host(url: &str) -> bool {
    ["localhost", "127.0.0.1"]
        .iter()
        .any(|host| url.starts_with(host))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A single API call, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path with leading slash, e.g. `/api/product-translations/12`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Executes [`ApiRequest`]s and yields the decoded JSON body.
///
/// Empty bodies (e.g. `204 No Content`) decode to `Value::Null`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: ApiRequest) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

// ---------------------------------------------------------------------------
// reqwest transport
// ---------------------------------------------------------------------------

/// [`Transport`] over HTTPS using `reqwest`.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    access_token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url);
        if base_url.is_empty() {
            return Err(ApiError::Unknown {
                status: None,
                message: "Back-office API URL is not configured".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(user_agent())
            .build()
            .map_err(|e| ApiError::Unknown {
                status: None,
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            access_token: config
                .access_token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Zeroizing::new(t.to_string())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token after a re-login.
    pub fn set_access_token(&mut self, token: Option<&str>) {
        self.access_token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Zeroizing::new(t.to_string()));
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let full_url = format!("{}{}", self.base_url, request.path);
        let request_id = Uuid::new_v4();

        debug!(
            method = %request.method,
            path = %request.path,
            request_id = %request_id,
            "back-office request"
        );

        let mut req = self
            .client
            .request(request.method.clone(), &full_url)
            .header("X-Request-Id", request_id.to_string());
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&self.base_url, &e))?;
        let status = resp.status();
        let body_text = resp
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&self.base_url, &e))?;

        if !status.is_success() {
            let err = ApiError::from_status(status, &body_text);
            warn!(
                method = %request.method,
                path = %request.path,
                request_id = %request_id,
                status = status.as_u16(),
                error = %err,
                "back-office request failed"
            );
            return Err(err);
        }

        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text).map_err(ApiError::invalid_response)
    }
}

fn user_agent() -> String {
    format!(
        "the-small-backoffice/{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_SHA")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme_and_strips_api_suffix() {
        assert_eq!(
            normalize_base_url("admin.thesmall.app/api/"),
            "https://admin.thesmall.app"
        );
        assert_eq!(
            normalize_base_url("localhost:5000/"),
            "http://localhost:5000"
        );
        assert_eq!(
            normalize_base_url(" https://backoffice.example.com//"),
            "https://backoffice.example.com"
        );
        assert_eq!(normalize_base_url("   "), "");
    }

    #[test]
    fn request_builder_collects_query() {
        let req = ApiRequest::get("/api/Languages/restaurant").query("branchId", 7);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query_value("branchId"), Some("7"));
        assert_eq!(req.query_value("missing"), None);
    }

    #[test]
    fn http_transport_requires_base_url() {
        let config = ClientConfig::new("");
        assert!(HttpTransport::new(&config).is_err());

        let mut config = ClientConfig::new("localhost:5000/api");
        config.access_token = Some("  ".to_string());
        let transport = HttpTransport::new(&config).expect("transport");
        assert_eq!(transport.base_url(), "http://localhost:5000");
        assert!(format!("{transport:?}").contains("authenticated: false"));
    }
}
