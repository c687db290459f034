use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::application::error::AppError;

use super::state::RecacheState;

pub async fn recache(
    State(state): State<RecacheState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let outcome = state.service.handle(&body).await?;
    Ok(outcome.into_response())
}

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
