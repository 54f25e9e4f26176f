//! Types used to define the fields of [`crate::config::Config`].

// Note this file should generally be restricted to simple struct/enum
// definitions that do not contain business logic.

use std::num::NonZeroU32;
use std::path::PathBuf;

use ragchat_embedding::CatalogModel;
use ragchat_embedding::LocalEmbedderOptions;
use ragchat_embedding::PoolingStrategy;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// Number of chunks requested from the store per question.
pub const DEFAULT_MATCH_COUNT: NonZeroU32 = match NonZeroU32::new(144) {
    Some(n) => n,
    None => panic!("match count must be non-zero"),
};

/// Dimension of all-mpnet-base-v2, the model the reference index was built with.
pub const DEFAULT_ONNX_DIMENSION: usize = 768;

pub const DEFAULT_RPC_FUNCTION: &str = "final_rag_call";

pub const DEFAULT_CONTEXT_DELIMITER: &str = "\n---\n";

pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_GENERATION_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_PERSONA: &str = "Sun Tzu's The Art of War";

/// Settings for the similarity-search RPC.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Upper bound on chunks the store may return; zero is rejected at parse time.
    pub match_count: NonZeroU32,

    /// Name of the database function invoked through `/rest/v1/rpc/<name>`.
    pub rpc_function: String,

    /// Separator placed between retrieved chunks.
    pub context_delimiter: String,

    pub vector_encoding: VectorEncoding,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_count: DEFAULT_MATCH_COUNT,
            rpc_function: DEFAULT_RPC_FUNCTION.to_string(),
            context_delimiter: DEFAULT_CONTEXT_DELIMITER.to_string(),
            vector_encoding: VectorEncoding::default(),
        }
    }
}

/// How the query vector travels in the RPC parameters.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VectorEncoding {
    /// `"[0.1,0.2,...]"`; the database function casts the text to a vector.
    #[default]
    Text,
    /// A native JSON array of numbers.
    Array,
}

/// Settings for the in-process embedding model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: CatalogModel,

    /// Directory with an ONNX export (`model.onnx`, `tokenizer.json`, ...).
    /// When set, `model` is ignored.
    pub model_dir: Option<PathBuf>,

    pub pooling: PoolingStrategy,

    /// Must equal the dimensionality the search index was built with.
    /// Defaults to the catalog model's dimension, or
    /// [`DEFAULT_ONNX_DIMENSION`] when `model_dir` is set.
    pub dimension: Option<usize>,

    /// Where catalog weights are cached. Defaults to `<home>/models`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: CatalogModel::default(),
            model_dir: None,
            pooling: PoolingStrategy::default(),
            dimension: None,
            cache_dir: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn dimension(&self) -> usize {
        match (self.dimension, &self.model_dir) {
            (Some(dim), _) => dim,
            (None, Some(_)) => DEFAULT_ONNX_DIMENSION,
            (None, None) => self.model.dimension(),
        }
    }

    pub fn local_options(&self) -> LocalEmbedderOptions {
        LocalEmbedderOptions {
            model: self.model,
            model_dir: self.model_dir.clone(),
            pooling: self.pooling,
            dimension: self.dimension(),
            cache_dir: self.cache_dir.clone(),
        }
    }
}

/// Settings for the generative model endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            base_url: DEFAULT_GENERATION_BASE_URL.to_string(),
        }
    }
}

/// Settings for the grounding prompt.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    /// Subject the assistant claims expertise in.
    pub persona: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}
