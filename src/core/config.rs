//! Retrieval configuration.
//!
//! All connection targets and credentials are resolved once at startup and
//! passed explicitly to constructors. There are no module-level singletons:
//! a handle built from this config owns its lifetime (opened at startup,
//! dropped at shutdown).

use std::env;

use serde::{Deserialize, Serialize};

use super::errors::RetrievalError;

/// Configuration surface the retrieval core depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Embedding provider credential (bearer token).
    pub embedding_api_key: String,
    /// Embedding provider endpoint, OpenAI-compatible.
    pub embedding_base_url: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Dimensionality the model produces. Must match the dimensionality of
    /// vectors stored in the target index.
    pub embedding_dimension: usize,

    /// Vector store connection URL.
    pub store_url: String,
    /// Optional vector store credential.
    pub store_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Target search index name.
    pub index_name: String,

    /// Candidate pool width requested from the store per query.
    pub fetch_k: usize,
    /// Results kept after the post-filter stage.
    pub keep_top: usize,
    /// Deadline for each outbound call, in seconds.
    pub request_timeout_secs: u64,
}

impl RetrievalConfig {
    /// Load from process environment variables.
    ///
    /// Required: `OPENAI_API_KEY`, `RAGQUERY_STORE_URL`. Everything else
    /// has a default and can be overridden via `RAGQUERY_*` variables.
    /// Fails with [`RetrievalError::Configuration`] before any network
    /// call is attempted.
    pub fn from_env() -> Result<Self, RetrievalError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load via an arbitrary lookup function. Tests inject maps here
    /// instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RetrievalError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let embedding_api_key = required(&lookup, "OPENAI_API_KEY")?;
        let store_url = required(&lookup, "RAGQUERY_STORE_URL")?;

        let config = Self {
            embedding_api_key,
            embedding_base_url: lookup("RAGQUERY_EMBEDDING_URL")
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            embedding_model: lookup("RAGQUERY_EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            embedding_dimension: parsed(&lookup, "RAGQUERY_EMBEDDING_DIMENSION", 1536)?,
            store_url,
            store_api_key: lookup("RAGQUERY_STORE_API_KEY"),
            collection: lookup("RAGQUERY_COLLECTION")
                .unwrap_or_else(|| "langchain.vectorSearch".to_string()),
            index_name: lookup("RAGQUERY_INDEX").unwrap_or_else(|| "default".to_string()),
            fetch_k: parsed(&lookup, "RAGQUERY_FETCH_K", 100)?,
            keep_top: parsed(&lookup, "RAGQUERY_KEEP_TOP", 1)?,
            request_timeout_secs: parsed(&lookup, "RAGQUERY_TIMEOUT_SECS", 30)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values before any handle is constructed.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.embedding_api_key.trim().is_empty() {
            return Err(RetrievalError::Configuration(
                "embedding credential is empty".to_string(),
            ));
        }
        if self.store_url.trim().is_empty() {
            return Err(RetrievalError::Configuration(
                "vector store URL is empty".to_string(),
            ));
        }
        if self.embedding_dimension == 0 {
            return Err(RetrievalError::Configuration(
                "embedding dimension must be >= 1".to_string(),
            ));
        }
        if self.fetch_k == 0 {
            return Err(RetrievalError::Configuration(
                "fetch_k must be >= 1".to_string(),
            ));
        }
        if self.keep_top == 0 || self.keep_top > self.fetch_k {
            return Err(RetrievalError::Configuration(format!(
                "keep_top must be in 1..={} (got {})",
                self.fetch_k, self.keep_top
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(RetrievalError::Configuration(
                "request timeout must be >= 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, RetrievalError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(RetrievalError::Configuration(format!(
            "the {} environment variable is not set",
            key
        ))),
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, RetrievalError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| RetrievalError::Configuration(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(default),
    }
}
