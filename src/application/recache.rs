//! Request handler sequencing authorization, invalidation and scheduling.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use recache_api_types::{InvocationResponse, RecacheResponseBody};
use tracing::info;

use crate::application::allow_list::AllowListResolver;
use crate::application::authorizer::RequestAuthorizer;
use crate::application::error::{
    AuthorizationError, ErrorReport, RecacheError, ValidationError,
};
use crate::application::invalidator::CacheInvalidator;
use crate::application::ports::{ArtifactStore, PortError, RecacheQueue, SecretStore};
use crate::application::scheduler::RecacheScheduler;
use crate::domain::urls::AuthorizedUrls;

pub const REJECTED_MESSAGE: &str = "Token does not exist or is misconfigured";
pub const NO_URLS_MESSAGE: &str = "No urls to recache";

const METRIC_REQUESTS: &str = "recache_requests_total";

/// Outcome label attached to responses for the access log.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeLabel(pub &'static str);

/// Terminal state of one recache request.
#[derive(Debug)]
pub enum RecacheOutcome {
    /// The token could not be resolved; nothing was touched.
    Rejected(AuthorizationError),
    /// The body was malformed or carried too many URLs; nothing was touched.
    Invalid(ValidationError),
    /// The token matched none of the requested URLs.
    Empty,
    /// Artifacts were deleted and regeneration jobs queued.
    Recached(AuthorizedUrls),
}

impl RecacheOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(_) => StatusCode::FORBIDDEN,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Empty | Self::Recached(_) => StatusCode::OK,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Invalid(ValidationError::MalformedBody(_)) => "malformed",
            Self::Invalid(ValidationError::TooManyUrls { .. }) => "too_many",
            Self::Empty => "empty",
            Self::Recached(_) => "recached",
        }
    }

    pub fn body(&self) -> RecacheResponseBody {
        match self {
            Self::Rejected(err) => {
                RecacheResponseBody::error(err.to_string(), Some(REJECTED_MESSAGE.to_string()))
            }
            Self::Invalid(err @ ValidationError::MalformedBody(source)) => {
                RecacheResponseBody::error(err.to_string(), Some(source.to_string()))
            }
            Self::Invalid(err @ ValidationError::TooManyUrls { .. }) => {
                RecacheResponseBody::error(err.to_string(), None)
            }
            Self::Empty => RecacheResponseBody::message(NO_URLS_MESSAGE),
            Self::Recached(urls) => RecacheResponseBody::recached(urls.as_slice().to_vec()),
        }
    }
}

impl RecacheOutcome {
    /// Status and serialized body in the shape a function invocation returns.
    pub fn invocation_response(&self) -> Result<InvocationResponse, serde_json::Error> {
        InvocationResponse::new(self.status().as_u16(), &self.body())
    }
}

impl IntoResponse for RecacheOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(self.body())).into_response();
        response.extensions_mut().insert(OutcomeLabel(self.label()));
        let report = match &self {
            Self::Rejected(err) => Some(ErrorReport::from_error(
                "application::recache::rejected",
                status,
                err,
            )),
            Self::Invalid(err) => Some(ErrorReport::from_error(
                "application::recache::invalid",
                status,
                err,
            )),
            Self::Empty | Self::Recached(_) => None,
        };
        if let Some(report) = report {
            report.attach(&mut response);
        }
        response
    }
}

/// Single entry point of the recache pipeline.
///
/// Collaborators are injected, so the service holds no process-wide state of its own.
#[derive(Clone)]
pub struct RecacheService {
    authorizer: RequestAuthorizer,
    invalidator: CacheInvalidator,
    scheduler: RecacheScheduler,
}

impl RecacheService {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        artifacts: Arc<dyn ArtifactStore>,
        queue: Arc<dyn RecacheQueue>,
    ) -> Self {
        Self {
            authorizer: RequestAuthorizer::new(AllowListResolver::new(secrets)),
            invalidator: CacheInvalidator::new(artifacts),
            scheduler: RecacheScheduler::new(queue),
        }
    }

    /// Handle one request body.
    ///
    /// Rejections and empty results are outcomes. Downstream failures during deletion or
    /// dispatch are returned as errors with no rollback of completed steps.
    pub async fn handle(&self, body: &[u8]) -> Result<RecacheOutcome, PortError> {
        let result = self.process(body).await;
        let label = match &result {
            Ok(outcome) => outcome.label(),
            Err(_) => "failed",
        };
        counter!(METRIC_REQUESTS, "outcome" => label).increment(1);
        result
    }

    async fn process(&self, body: &[u8]) -> Result<RecacheOutcome, PortError> {
        let urls = match self.authorizer.authorize(body).await {
            Ok(urls) => urls,
            Err(RecacheError::Authorization(err)) => return Ok(RecacheOutcome::Rejected(err)),
            Err(RecacheError::Validation(err)) => return Ok(RecacheOutcome::Invalid(err)),
        };

        if urls.is_empty() {
            info!(
                target = "prerender_recache::application::recache",
                "no valid urls to recache"
            );
            return Ok(RecacheOutcome::Empty);
        }

        self.invalidator.invalidate(&urls).await?;
        self.scheduler.schedule(&urls).await?;

        info!(
            target = "prerender_recache::application::recache",
            urls = urls.len(),
            "recache scheduled"
        );

        Ok(RecacheOutcome::Recached(urls))
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;

    use super::*;

    #[test]
    fn recached_invocation_wraps_the_body_as_a_string() {
        let outcome = RecacheOutcome::Recached(AuthorizedUrls::new(vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ]));

        assert_json_snapshot!(outcome.invocation_response().expect("serializable"), @r#"
        {
          "statusCode": 200,
          "body": "{\"urlsToRecache\":[\"https://example.com/a\",\"https://example.com/b\"]}"
        }
        "#);
    }

    #[test]
    fn rejected_invocation_carries_forbidden_status() {
        let outcome = RecacheOutcome::Rejected(AuthorizationError::UnknownToken);

        assert_json_snapshot!(outcome.invocation_response().expect("serializable"), @r#"
        {
          "statusCode": 403,
          "body": "{\"error\":\"token is not present in the allow-list\",\"message\":\"Token does not exist or is misconfigured\"}"
        }
        "#);
    }

    #[test]
    fn outcome_labels_follow_the_state_machine() {
        assert_eq!(RecacheOutcome::Empty.label(), "empty");
        assert_eq!(
            RecacheOutcome::Invalid(ValidationError::TooManyUrls {
                count: 1001,
                max: 1000
            })
            .label(),
            "too_many"
        );
        assert_eq!(RecacheOutcome::Empty.status(), StatusCode::OK);
    }
}
