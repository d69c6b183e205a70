use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{AppError, Result};

/// Serializes a view as a JSON response.
pub fn render<T: Serialize>(status: StatusCode, view: &T) -> Result<Response> {
    let body = sonic_rs::to_string(view)
        .map_err(|e| AppError::Internal(format!("View serialization failed: {}", e)))?;

    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}
