use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::ports::PortError, domain::allow_list::AllowListError, infra::error::InfraError,
};

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// The token could not be resolved to an allow-list entry.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("request carries no prerender token")]
    MissingToken,
    #[error("token secret could not be read: {0}")]
    SecretUnavailable(#[source] PortError),
    #[error("No secret found")]
    SecretEmpty,
    #[error("token secret is malformed: {0}")]
    SecretMalformed(#[from] AllowListError),
    #[error("token is not present in the allow-list")]
    UnknownToken,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed request body")]
    MalformedBody(#[source] serde_json::Error),
    #[error("Too many urls, maximum is {max}")]
    TooManyUrls { count: usize, max: usize },
}

/// Reasons a request is turned away before any downstream side effect.
#[derive(Debug, Error)]
pub enum RecacheError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Downstream(#[from] PortError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Downstream(_) => "Internal server error",
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(_) | AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}
