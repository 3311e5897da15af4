use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::auth::Authenticator;
use crate::error::ApiError;

/// Login of the caller, `None` for anonymous requests
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity(pub Option<String>);

impl Identity {
    pub fn login(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_jwt_from_headers(&parts.headers).map_err(ApiError::unauthorized)? else {
            return Ok(Identity(None));
        };

        let authenticator = parts
            .extensions
            .get::<Authenticator>()
            .ok_or_else(|| ApiError::internal_server_error("Authentication is not configured"))?;

        let claims = authenticator.verify(&token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            ApiError::unauthorized(e.to_string())
        })?;

        Ok(Identity(Some(claims.sub)))
    }
}

/// Bearer token from the Authorization header; `None` when the header is absent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token".to_string()),
        Some(token) => Ok(Some(token.trim().to_string())),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use axum::http::Request;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/invoices");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        parts.extensions.insert(Authenticator::new("secret").unwrap());
        parts
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let identity = Identity::from_request_parts(&mut parts(None), &()).await.unwrap();
        assert_eq!(identity.login(), None);
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let token = generate_jwt("secret", &Claims::new("alice", &[], 1)).unwrap();
        let header = format!("Bearer {token}");

        let identity = Identity::from_request_parts(&mut parts(Some(&header)), &()).await.unwrap();
        assert_eq!(identity.login(), Some("alice"));
    }

    #[tokio::test]
    async fn bad_tokens_are_unauthorized() {
        for header in ["Bearer not-a-jwt", "Basic YWxpY2U6cHc=", "Bearer "] {
            let result = Identity::from_request_parts(&mut parts(Some(header)), &()).await;
            assert!(matches!(result, Err(ApiError::Unauthorized(_))), "{header}");
        }
    }
}
