//! Wire types for the prerender recache API.
//!
//! These mirror the JSON accepted and produced by `POST /recache` so that
//! clients and the service agree on field names without sharing the service crate.

use serde::{Deserialize, Serialize};

/// Body accepted by the recache endpoint.
///
/// `urls` takes precedence over `url`; a request carrying neither recaches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecacheRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerender_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

impl RecacheRequest {
    /// Decode a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Every JSON body the recache endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecacheResponseBody {
    Recached {
        #[serde(rename = "urlsToRecache")]
        urls_to_recache: Vec<String>,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Message {
        message: String,
    },
}

impl RecacheResponseBody {
    pub fn recached(urls: Vec<String>) -> Self {
        Self::Recached {
            urls_to_recache: urls,
        }
    }

    pub fn error(error: impl Into<String>, message: Option<String>) -> Self {
        Self::Error {
            error: error.into(),
            message,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Function-style result printed by the one-shot `invoke` command.
///
/// `body` holds the serialized [`RecacheResponseBody`], not a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn new(status_code: u16, body: &RecacheResponseBody) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code,
            body: serde_json::to_string(body)?,
        })
    }
}
