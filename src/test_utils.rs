//! Shared test helpers.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;
use crate::languages::{Language, RestaurantLanguages};

/// Replays queued responses in order and records every request.
/// An empty queue answers `Value::Null`.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_ok(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub(crate) fn push_err(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

/// `en` (default) and `tr`.
pub(crate) fn en_tr() -> RestaurantLanguages {
    RestaurantLanguages::new(
        vec![
            Language::new("en", "English", "English"),
            Language::new("tr", "Turkish", "Türkçe"),
        ],
        "en",
    )
    .unwrap()
}

/// `en` (default), `tr` and `de`.
pub(crate) fn en_tr_de() -> RestaurantLanguages {
    RestaurantLanguages::new(
        vec![
            Language::new("en", "English", "English"),
            Language::new("tr", "Turkish", "Türkçe"),
            Language::new("de", "German", "Deutsch"),
        ],
        "en",
    )
    .unwrap()
}
