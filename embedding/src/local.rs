use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::EmbeddingModel;
use fastembed::InitOptions;
use fastembed::InitOptionsUserDefined;
use fastembed::Pooling;
use fastembed::TextEmbedding;
use fastembed::TokenizerFiles;
use fastembed::UserDefinedEmbeddingModel;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::provider::EmbeddingError;
use crate::provider::EmbeddingProvider;
use crate::provider::check_dimension;

/// Sentence-embedding models from the fastembed catalog that can be selected
/// by name in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CatalogModel {
    /// 768-dim mpnet-base sentence-transformer (multilingual paraphrase variant).
    #[default]
    #[serde(rename = "paraphrase-multilingual-mpnet-base-v2")]
    ParaphraseMultilingualMpnetBaseV2,
    #[serde(rename = "all-minilm-l6-v2")]
    AllMinilmL6V2,
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
    #[serde(rename = "bge-base-en-v1.5")]
    BgeBaseEnV15,
    #[serde(rename = "multilingual-e5-base")]
    MultilingualE5Base,
}

impl CatalogModel {
    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            CatalogModel::ParaphraseMultilingualMpnetBaseV2 => {
                EmbeddingModel::ParaphraseMLMpnetBaseV2
            }
            CatalogModel::AllMinilmL6V2 => EmbeddingModel::AllMiniLML6V2,
            CatalogModel::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            CatalogModel::BgeBaseEnV15 => EmbeddingModel::BGEBaseENV15,
            CatalogModel::MultilingualE5Base => EmbeddingModel::MultilingualE5Base,
        }
    }

    /// Output dimension of the model.
    pub const fn dimension(self) -> usize {
        match self {
            CatalogModel::AllMinilmL6V2 | CatalogModel::BgeSmallEnV15 => 384,
            CatalogModel::ParaphraseMultilingualMpnetBaseV2
            | CatalogModel::BgeBaseEnV15
            | CatalogModel::MultilingualE5Base => 768,
        }
    }
}

/// How token embeddings of a user-supplied ONNX export are pooled into one
/// sentence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolingStrategy {
    /// sentence-transformers models such as all-mpnet-base-v2.
    #[default]
    Mean,
    Cls,
}

/// Settings used once at startup to load the local model.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEmbedderOptions {
    pub model: CatalogModel,
    /// Directory holding an ONNX export; takes precedence over `model`.
    pub model_dir: Option<PathBuf>,
    pub pooling: PoolingStrategy,
    /// Dimension the search index was built with.
    pub dimension: usize,
    /// Where catalog weights are downloaded and cached.
    pub cache_dir: Option<PathBuf>,
}

impl Default for LocalEmbedderOptions {
    fn default() -> Self {
        let model = CatalogModel::default();
        Self {
            model,
            model_dir: None,
            pooling: PoolingStrategy::default(),
            dimension: model.dimension(),
            cache_dir: None,
        }
    }
}

/// In-process sentence-embedding model backed by fastembed (ONNX runtime).
///
/// `TextEmbedding::embed` requires exclusive access, so the model sits behind
/// a `Mutex` and the embedder can be shared across the session.
pub struct LocalEmbedder {
    model: Mutex<TextEmbedding>,
    dim: usize,
}

impl LocalEmbedder {
    /// Load the model described by `opts`. Fails with
    /// [`EmbeddingError::ModelLoad`] if the weights cannot be loaded.
    pub fn load(opts: &LocalEmbedderOptions) -> Result<Self, EmbeddingError> {
        let model = match &opts.model_dir {
            Some(dir) => load_user_defined(dir, opts.pooling)?,
            None => {
                if opts.dimension != opts.model.dimension() {
                    return Err(EmbeddingError::InvalidDimension {
                        expected: opts.dimension,
                        got: opts.model.dimension(),
                    });
                }
                let mut init = InitOptions::new(opts.model.fastembed_model())
                    .with_show_download_progress(false);
                if let Some(cache_dir) = &opts.cache_dir {
                    init = init.with_cache_dir(cache_dir.clone());
                }
                TextEmbedding::try_new(init)
                    .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
            }
        };
        info!(
            model = ?opts.model,
            model_dir = ?opts.model_dir,
            dimension = opts.dimension,
            "embedding model loaded"
        );
        Ok(Self {
            model: Mutex::new(model),
            dim: opts.dimension,
        })
    }
}

fn load_user_defined(dir: &Path, pooling: PoolingStrategy) -> Result<TextEmbedding, EmbeddingError> {
    let read = |name: &str| -> Result<Vec<u8>, EmbeddingError> {
        let path = dir.join(name);
        fs::read(&path).map_err(|e| {
            EmbeddingError::ModelLoad(format!("cannot read {}: {e}", path.display()))
        })
    };

    let tokenizer_files = TokenizerFiles {
        tokenizer_file: read("tokenizer.json")?,
        config_file: read("config.json")?,
        special_tokens_map_file: read("special_tokens_map.json")?,
        tokenizer_config_file: read("tokenizer_config.json")?,
    };
    let pooling = match pooling {
        PoolingStrategy::Mean => Pooling::Mean,
        PoolingStrategy::Cls => Pooling::Cls,
    };
    let user_model =
        UserDefinedEmbeddingModel::new(read("model.onnx")?, tokenizer_files).with_pooling(pooling);

    TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
        .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))
}

impl EmbeddingProvider for LocalEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::Inference("embedding model lock poisoned".to_string()))?;
        let vectors = model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
        for v in &vectors {
            check_dimension(self.dim, v)?;
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
