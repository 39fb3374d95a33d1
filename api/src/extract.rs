//! Extractors that convert axum rejections to structured `AppError` responses.
//!
//! `AppForm<T>` and `AppQuery<T>` are drop-in replacements for `axum::Form<T>`
//! and `axum::extract::Query<T>`. Rejections become `AppError::Validation`
//! instead of axum's plain-text 415/422 responses.

use axum::Form;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;

use crate::error::AppError;

pub struct AppForm<T>(pub T);

impl<S, T> FromRequest<S> for AppForm<T>
where
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(AppForm(value)),
            Err(rejection) => Err(map_form_rejection(rejection)),
        }
    }
}

pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => Err(AppError::Validation {
                message: format!("Invalid query string: {}", rejection.body_text()),
                field: extract_field_from_serde_message(&rejection.body_text()),
                received: None,
                docs_hint: Some("Open the login_url returned by tools/call.".to_string()),
            }),
        }
    }
}

pub fn map_form_rejection(rejection: FormRejection) -> AppError {
    let docs_hint = Some(
        "Submit the login form as application/x-www-form-urlencoded with sessionId and phoneNumber."
            .to_string(),
    );
    match rejection {
        FormRejection::InvalidFormContentType(_) => AppError::Validation {
            message: "Content-Type must be application/x-www-form-urlencoded".to_string(),
            field: Some("content-type".to_string()),
            received: None,
            docs_hint,
        },
        other => {
            let body_text = other.body_text();
            AppError::Validation {
                message: format!("Invalid form body: {body_text}"),
                field: Some(
                    extract_field_from_serde_message(&body_text).unwrap_or("body".to_string()),
                ),
                received: None,
                docs_hint,
            }
        }
    }
}

/// Field name from serde's "missing field `x`" / "unknown field `x`" messages.
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    ["missing field `", "unknown field `"].iter().find_map(|pattern| {
        let start = msg.find(pattern)? + pattern.len();
        let after = &msg[start..];
        after.find('`').map(|end| after[..end].to_string())
    })
}
