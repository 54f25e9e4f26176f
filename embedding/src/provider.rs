use thiserror::Error;

/// Errors that can occur when producing embeddings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    #[error("failed to load embedding model: {0}")]
    ModelLoad(String),

    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("embedding has {got} dimensions, expected {expected}")]
    InvalidDimension { expected: usize, got: usize },
}

/// Provider interface for generating fixed-dimension embeddings.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for each input text.
    /// Implementations must return vectors of length [`Self::dimension`].
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut out = self.embed(&[text.to_string()])?;
        let vector = out.pop().ok_or_else(|| {
            EmbeddingError::Inference("provider returned no vector".to_string())
        })?;
        check_dimension(self.dimension(), &vector)?;
        Ok(vector)
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Fail with [`EmbeddingError::InvalidDimension`] unless `vector` has `expected` elements.
pub fn check_dimension(expected: usize, vector: &[f32]) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::InvalidDimension {
            expected,
            got: vector.len(),
        });
    }
    Ok(())
}
