// HTTP API Error Types
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::database::DatabaseError;
use crate::middleware::response::Alerts;
use crate::resource::ResourceError;
use crate::search::SearchError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest {
        message: String,
        entity_name: Option<&'static str>,
        error_key: Option<&'static str>,
        /// `X-{app}-error` headers, present once the error passed through a resource handler
        alerts: Option<HeaderMap>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (search engine)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::BadRequest {
            entity_name: Some(entity_name),
            error_key: Some(error_key),
            ..
        } = self
        {
            body["entityName"] = json!(entity_name);
            body["errorKey"] = json!(error_key);
        }

        body
    }

    /// Attach the application's failure alert headers to a bad request
    pub fn with_alerts(self, alerts: &Alerts) -> Self {
        match self {
            ApiError::BadRequest {
                message,
                entity_name: Some(entity_name),
                error_key: Some(error_key),
                ..
            } => ApiError::BadRequest {
                alerts: Some(alerts.failure(entity_name, error_key)),
                message,
                entity_name: Some(entity_name),
                error_key: Some(error_key),
            },
            other => other,
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            entity_name: None,
            error_key: None,
            alerts: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unavailable() {
            tracing::error!("Database unavailable: {}", err);
            return ApiError::service_unavailable("Database temporarily unavailable");
        }
        // Don't expose internal SQL errors to clients
        tracing::error!("Database error: {}", err);
        ApiError::internal_server_error("Database error occurred")
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        tracing::error!("Search query failed: {}", err);
        ApiError::bad_gateway("Search engine unavailable")
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Validation { entity, key, message } => ApiError::BadRequest {
                message,
                entity_name: Some(entity),
                error_key: Some(key),
                alerts: None,
            },
            ResourceError::NotFound { .. } => ApiError::not_found(err.to_string()),
            ResourceError::NotSearchable(_) => ApiError::not_found(err.to_string()),
            ResourceError::Store(e) => e.into(),
            ResourceError::Search(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = Json(self.to_json());
        match self {
            ApiError::BadRequest {
                alerts: Some(headers), ..
            } => (status, headers, body).into_response(),
            _ => (status, body).into_response(),
        }
    }
}
