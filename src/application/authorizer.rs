use recache_api_types::RecacheRequest;
use tracing::{debug, info};

use crate::application::allow_list::AllowListResolver;
use crate::application::error::{AuthorizationError, RecacheError, ValidationError};
use crate::domain::urls::{AuthorizedUrls, MAX_URLS};

/// Turns a raw request body into the URLs its token may recache.
#[derive(Clone)]
pub struct RequestAuthorizer {
    resolver: AllowListResolver,
}

impl RequestAuthorizer {
    pub fn new(resolver: AllowListResolver) -> Self {
        Self { resolver }
    }

    /// Parse, size-guard, resolve the token, then filter candidates.
    ///
    /// The size guard runs on the raw candidate list so oversized requests never reach
    /// the secret store.
    pub async fn authorize(&self, body: &[u8]) -> Result<AuthorizedUrls, RecacheError> {
        let request = parse_request(body)?;
        let token = request.prerender_token.clone();
        let candidates = candidate_urls(request);

        if candidates.len() > MAX_URLS {
            info!(
                target = "prerender_recache::application::authorizer",
                received = candidates.len(),
                maximum = MAX_URLS,
                "too many urls"
            );
            return Err(ValidationError::TooManyUrls {
                count: candidates.len(),
                max: MAX_URLS,
            }
            .into());
        }

        let token = token.ok_or(AuthorizationError::MissingToken)?;
        let prefixes = self.resolver.resolve(&token).await?;

        let candidate_count = candidates.len();
        let authorized = prefixes.retain_permitted(candidates);
        debug!(
            target = "prerender_recache::application::authorizer",
            candidates = candidate_count,
            authorized = authorized.len(),
            "filtered candidate urls"
        );

        Ok(AuthorizedUrls::new(authorized))
    }
}

pub fn parse_request(body: &[u8]) -> Result<RecacheRequest, ValidationError> {
    RecacheRequest::from_slice(body).map_err(ValidationError::MalformedBody)
}

/// `urls` when present, otherwise the single `url`, otherwise nothing.
pub fn candidate_urls(request: RecacheRequest) -> Vec<String> {
    match (request.urls, request.url) {
        (Some(urls), _) => urls,
        (None, Some(url)) => vec![url],
        (None, None) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: Option<&str>, urls: Option<Vec<&str>>) -> RecacheRequest {
        RecacheRequest {
            prerender_token: Some("t1".to_string()),
            url: url.map(str::to_string),
            urls: urls.map(|list| list.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn urls_take_precedence_over_url() {
        let candidates = candidate_urls(request(
            Some("https://example.com/single"),
            Some(vec!["https://example.com/a", "https://example.com/b"]),
        ));
        assert_eq!(candidates, ["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn single_url_becomes_one_candidate() {
        let candidates = candidate_urls(request(Some("https://example.com/single"), None));
        assert_eq!(candidates, ["https://example.com/single"]);
    }

    #[test]
    fn neither_field_yields_no_candidates() {
        assert!(candidate_urls(request(None, None)).is_empty());
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        assert!(matches!(
            parse_request(b"not json"),
            Err(ValidationError::MalformedBody(_))
        ));
        assert!(matches!(
            parse_request(b""),
            Err(ValidationError::MalformedBody(_))
        ));
    }
}
