//! Turning a query vector into grounding context.
//!
//! [`VectorSearch`] is the remote similarity-search call; [`Retriever`] wraps
//! it and classifies the outcome into a [`Retrieval`], so "the store found
//! nothing" and "the call failed" stay distinguishable.

use std::future::Future;
use std::num::NonZeroU32;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

/// One record returned by the similarity search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchedChunk {
    pub content: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub similarity: Option<f64>,
}

impl MatchedChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            id: None,
            similarity: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetrieveError {
    #[error("query embedding has {got} dimensions but the index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid search endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search RPC returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("could not decode search response: {0}")]
    Decode(String),
}

/// A single best-effort similarity search against the remote store.
pub trait VectorSearch: Send + Sync {
    /// Return up to `match_count` records, in the order the store ranks them.
    /// Zero matches is `Ok(vec![])`, not an error.
    fn search(
        &self,
        embedding: &[f32],
        match_count: NonZeroU32,
    ) -> impl Future<Output = Result<Vec<MatchedChunk>, RetrieveError>> + Send;
}

/// Context assembled from the chunks the store returned.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    /// Chunk contents joined with the configured delimiter.
    pub text: String,
    /// Chunk contents in store order.
    pub chunks: Vec<String>,
}

impl RetrievedContext {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Context(RetrievedContext),
    /// The store answered but had nothing relevant.
    EmptyMatches,
    /// The call itself failed; the error is kept for messaging and logs.
    CallFailed(RetrieveError),
}

pub struct Retriever<S> {
    search: S,
    delimiter: String,
    dimension: usize,
}

impl<S: VectorSearch> Retriever<S> {
    /// `dimension` is the length the backing index was built with.
    pub fn new(search: S, delimiter: impl Into<String>, dimension: usize) -> Self {
        Self {
            search,
            delimiter: delimiter.into(),
            dimension,
        }
    }

    pub fn search_backend(&self) -> &S {
        &self.search
    }

    pub async fn retrieve(&self, embedding: &[f32], match_count: NonZeroU32) -> Retrieval {
        if embedding.len() != self.dimension {
            let err = RetrieveError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            };
            warn!("skipping search: {err}");
            return Retrieval::CallFailed(err);
        }

        match self.search.search(embedding, match_count).await {
            Ok(records) if records.is_empty() => {
                debug!("search returned no matches");
                Retrieval::EmptyMatches
            }
            Ok(records) => {
                let chunks: Vec<String> = records.into_iter().map(|r| r.content).collect();
                let text = chunks.join(&self.delimiter);
                debug!(chunks = chunks.len(), "search returned context");
                Retrieval::Context(RetrievedContext { text, chunks })
            }
            Err(err) => {
                warn!("search call failed: {err}");
                Retrieval::CallFailed(err)
            }
        }
    }
}
