use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;

/// Header carrying the name of the service to throttle
pub const SERVICE_NAME_HEADER: &str = "service_name";

const JSON_CONTENT_TYPE: &str = "application/json";

/// YAML body extractor.
///
/// Requests declaring a JSON content type are rejected before the body is
/// read. Any other content type is decoded as YAML.
pub struct AppYaml<T>(pub T);

impl<T, S> FromRequest<S> for AppYaml<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        if is_json_content_type(req.headers()) {
            return Err(AppError::UnsupportedContentType(
                JSON_CONTENT_TYPE.to_string(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::PayloadRead(rejection.body_text()))?;

        let value = serde_yaml::from_slice(&bytes)
            .map_err(|e| AppError::PayloadParse(format!("Invalid YAML: {}", e)))?;

        Ok(Self(value))
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Non-empty value of the `service_name` header
pub struct ServiceName(pub String);

impl<S> FromRequestParts<S> for ServiceName
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SERVICE_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or_else(|| AppError::BadRequest("service name is not provided".to_string()))
    }
}
