use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has been deserialized and passed `validator` rules.
/// Every rejection is reported as a 400.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(rejection)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn rejection(err: JsonRejection) -> ApiError {
    match err {
        JsonRejection::JsonDataError(e) => data_error(&e.body_text()),
        JsonRejection::JsonSyntaxError(e) => ApiError::invalid_json(e.body_text()),
        JsonRejection::MissingJsonContentType(e) => ApiError::bad_request(e.body_text()),
        other => ApiError::bad_request(other.body_text()),
    }
}

/// Serde reports `path: reason`; surface the path as the offending field.
fn data_error(body: &str) -> ApiError {
    let detail = body
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(body);

    match detail.split_once(": ") {
        Some((field, reason)) if !field.is_empty() && field != "." && !field.contains(' ') => {
            let mut field_errors = HashMap::new();
            field_errors.insert(field.to_string(), reason.to_string());
            ApiError::validation_error("Invalid request body", Some(field_errors))
        }
        _ => ApiError::validation_error(detail.to_string(), None),
    }
}
