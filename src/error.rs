//! Typed errors at the document-store boundary.
//!
//! Everything above the store uses `anyhow` with context; the store itself reports one of
//! these so callers (and tests) can tell a dead network from a rejected request.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection/timeout/TLS failure before a response arrived.
    #[error("transport error on {op}: {source}")]
    Transport {
        op: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("{op} failed with HTTP {status}: {body}")]
    Status { op: String, status: u16, body: String },

    /// Response body did not have the expected shape.
    #[error("unexpected response from {op}: {reason}")]
    Decode { op: String, reason: String },

    /// No page with this title exists, so a mention cannot be created.
    #[error("no page found with name '{0}'")]
    Unresolved(String),

    /// Object id unknown to the store.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn decode(op: &str, reason: impl Into<String>) -> Self {
        StoreError::Decode {
            op: op.to_string(),
            reason: reason.into(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
