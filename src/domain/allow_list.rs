//! Token allow-lists: which URL prefixes a prerender token may recache.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllowListError {
    #[error("secret value is not a JSON-encoded string: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("secret payload is not a token-to-urls object: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Mapping from prerender token to its comma-separated URL prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: HashMap<String, String>,
}

impl AllowList {
    /// Decode the secret value.
    ///
    /// The stored value is a JSON string whose content is itself a JSON object,
    /// e.g. `"{\"tokenA\":\"https://a.example,https://b.example\"}"`.
    pub fn from_secret_string(raw: &str) -> Result<Self, AllowListError> {
        let payload: String = serde_json::from_str(raw).map_err(AllowListError::Envelope)?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&payload).map_err(AllowListError::Payload)?;
        Ok(Self { entries })
    }

    pub fn prefixes_for(&self, token: &str) -> Option<UrlPrefixes> {
        self.entries.get(token).map(|raw| UrlPrefixes::parse(raw))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// URL prefixes granted to one token.
///
/// Matching is containment: a URL is permitted when any prefix occurs anywhere in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPrefixes(Vec<String>);

impl UrlPrefixes {
    /// Split a comma-separated prefix list. Segments are kept verbatim, empty ones included.
    pub fn parse(raw: &str) -> Self {
        Self(raw.split(',').map(str::to_string).collect())
    }

    pub fn permits(&self, url: &str) -> bool {
        self.0.iter().any(|prefix| url.contains(prefix.as_str()))
    }

    /// Keep the permitted candidates, in request order and without deduplication.
    pub fn retain_permitted(&self, candidates: Vec<String>) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|url| self.permits(url))
            .collect()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(object: &str) -> String {
        serde_json::to_string(object).expect("string encodes")
    }

    #[test]
    fn decodes_double_encoded_secret() {
        let raw = encoded(r#"{"tokenabc":"https://aligent.com,https://example.com"}"#);
        let allow_list = AllowList::from_secret_string(&raw).expect("valid secret");

        let prefixes = allow_list.prefixes_for("tokenabc").expect("token present");
        assert_eq!(
            prefixes.as_slice(),
            ["https://aligent.com", "https://example.com"]
        );
        assert!(allow_list.prefixes_for("other").is_none());
    }

    #[test]
    fn plain_object_secret_is_rejected() {
        let err = AllowList::from_secret_string(r#"{"t1":"https://example.com"}"#)
            .expect_err("object is not an encoded string");
        assert!(matches!(err, AllowListError::Envelope(_)));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = AllowList::from_secret_string(&encoded("[1,2,3]")).expect_err("array payload");
        assert!(matches!(err, AllowListError::Payload(_)));
    }

    #[test]
    fn containment_match_admits_substrings() {
        let prefixes = UrlPrefixes::parse("https://example.com");
        assert!(prefixes.permits("https://example.com/a"));
        assert!(prefixes.permits("https://notexample.com"));
        assert!(prefixes.permits("https://evil.com/?x=https://example.com"));
        assert!(!prefixes.permits("https://other.org/a"));
    }

    #[test]
    fn retain_preserves_order_and_duplicates() {
        let prefixes = UrlPrefixes::parse("https://www.aligent.com.au,https://staging.aligent.com.au");
        let kept = prefixes.retain_permitted(vec![
            "https://staging.aligent.com.au/b".to_string(),
            "https://testing.aligent.com.au/abc".to_string(),
            "https://www.aligent.com.au/abc".to_string(),
            "https://staging.aligent.com.au/b".to_string(),
        ]);
        assert_eq!(
            kept,
            [
                "https://staging.aligent.com.au/b",
                "https://www.aligent.com.au/abc",
                "https://staging.aligent.com.au/b",
            ]
        );
    }

    #[test]
    fn empty_segment_is_kept_verbatim() {
        let prefixes = UrlPrefixes::parse("https://a.example,");
        assert_eq!(prefixes.len(), 2);
        assert!(prefixes.permits("https://anything.example"));
    }
}
