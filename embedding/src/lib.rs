//! Text embedding for the retrieval pipeline.
//!
//! The model is loaded once and shared read-only across chat turns; callers
//! depend on [`EmbeddingProvider`] so tests can substitute a deterministic
//! provider.

pub mod hash;
pub mod local;
pub mod provider;
pub mod vector;

pub use hash::HashEmbeddingProvider;
pub use local::CatalogModel;
pub use local::LocalEmbedder;
pub use local::LocalEmbedderOptions;
pub use local::PoolingStrategy;
pub use provider::EmbeddingError;
pub use provider::EmbeddingProvider;
pub use vector::cosine_similarity;
pub use vector::encode_vector_literal;
