use sha1::Digest;
use sha1::Sha1;

use crate::provider::EmbeddingError;
use crate::provider::EmbeddingProvider;

/// A deterministic provider that derives vectors from SHA-1 digests of the
/// input. Identical text always yields the identical vector, which makes it
/// useful for tests and for exercising the pipeline without model weights.
/// The vectors carry no semantic meaning.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dim: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.dim);
        let mut block: u32 = 0;
        while out.len() < self.dim {
            let mut hasher = Sha1::new();
            hasher.update(block.to_le_bytes());
            hasher.update(text.as_bytes());
            for byte in hasher.finalize() {
                if out.len() == self.dim {
                    break;
                }
                // Map each byte into [-1, 1].
                out.push((f32::from(byte) / 255.0) * 2.0 - 1.0);
            }
            block = block.wrapping_add(1);
        }
        out
    }
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
