//! URL sets flowing through the recache pipeline.

/// Ceiling on candidate URLs per request. Matches the object store's per-call delete limit.
pub const MAX_URLS: usize = 1000;

/// URLs a token is permitted to recache, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedUrls(Vec<String>);

impl AuthorizedUrls {
    pub fn new(urls: Vec<String>) -> Self {
        Self(urls)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
