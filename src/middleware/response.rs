use axum::{
    http::{header::LOCATION, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::domain::ValidationOutcome;
use crate::types::Operation;

/// Successful response: raw JSON body plus alert headers
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub status_code: StatusCode,
    pub headers: HeaderMap,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data: Some(data),
            status_code,
            headers: HeaderMap::new(),
        }
    }

    /// 201 with a `Location` header
    pub fn created(data: T, location: &str) -> Self {
        let mut response = Self::with_status(data, StatusCode::CREATED);
        if let Ok(value) = HeaderValue::from_str(location) {
            response.headers.insert(LOCATION, value);
        }
        response
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }
}

impl ApiResponse<()> {
    pub fn no_content() -> Self {
        Self {
            data: None,
            status_code: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let Some(data) = self.data else {
            return (self.status_code, self.headers).into_response();
        };

        let value = match serde_json::to_value(&data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": true,
                        "message": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR"
                    })),
                )
                    .into_response();
            }
        };

        (self.status_code, self.headers, Json(value)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

/// Builds the `X-{app}-*` headers the gateway turns into UI notifications
#[derive(Debug, Clone)]
pub struct Alerts {
    application: String,
}

impl Alerts {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
        }
    }

    pub fn created(&self, entity_name: &str, id: i64) -> HeaderMap {
        self.mutated(Operation::Create, entity_name, &id.to_string())
    }

    pub fn updated(&self, entity_name: &str, id: impl ToString) -> HeaderMap {
        self.mutated(Operation::Update, entity_name, &id.to_string())
    }

    pub fn deleted(&self, entity_name: &str, id: i64) -> HeaderMap {
        self.mutated(Operation::Delete, entity_name, &id.to_string())
    }

    fn mutated(&self, operation: Operation, entity_name: &str, id: &str) -> HeaderMap {
        let article = match operation {
            Operation::Create => "A new",
            Operation::Update | Operation::Delete => "A",
        };
        let message = format!("{article} {entity_name} is {} with identifier {id}", operation.verb());
        self.alert(&message, id)
    }

    pub fn failure(&self, entity_name: &str, error_key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.insert(&mut headers, "error", &format!("error.{error_key}"));
        self.insert(&mut headers, "params", entity_name);
        headers
    }

    /// Empty for valid records
    pub fn validation(&self, outcome: &ValidationOutcome) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !outcome.is_valid() {
            self.insert(&mut headers, "validation", &outcome.summary());
        }
        headers
    }

    fn alert(&self, message: &str, param: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.insert(&mut headers, "alert", message);
        self.insert(&mut headers, "params", param);
        headers
    }

    fn insert(&self, headers: &mut HeaderMap, suffix: &str, value: &str) {
        let name = format!("X-{}-{}", self.application, suffix);
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Skipping unrepresentable header {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationIssue;

    #[test]
    fn created_alert_names_entity_and_id() {
        let headers = Alerts::new("fmsApp").created("paymentsInvoice", 12);
        assert_eq!(headers["x-fmsapp-alert"], "A new paymentsInvoice is created with identifier 12");
        assert_eq!(headers["x-fmsapp-params"], "12");
    }

    #[test]
    fn validation_header_only_for_invalid_records() {
        let alerts = Alerts::new("fmsApp");
        assert!(alerts.validation(&ValidationOutcome::Valid).is_empty());

        let invalid = ValidationOutcome::from_issues(vec![ValidationIssue::new("toPay", "Invalid amount to pay")]);
        assert_eq!(alerts.validation(&invalid)["x-fmsapp-validation"], "toPay: Invalid amount to pay");
    }

    #[test]
    fn no_content_has_empty_body() {
        let response = ApiResponse::no_content()
            .with_headers(Alerts::new("fmsApp").deleted("flightsFlight", 3))
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["x-fmsapp-alert"], "A flightsFlight is deleted with identifier 3");
    }

    #[test]
    fn created_sets_location() {
        let response = ApiResponse::created(json!({"id": 1}), "/api/flights/1").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[LOCATION], "/api/flights/1");
    }
}
