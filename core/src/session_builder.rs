use ragchat_embedding::EmbeddingProvider;
use thiserror::Error;
use tracing::info;

use crate::answerer::Answerer;
use crate::answerer::GenerateError;
use crate::answerer::PromptTemplate;
use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::orchestrator::ChatSession;
use crate::retriever::RetrieveError;
use crate::retriever::Retriever;
use crate::secrets::Secrets;
use crate::supabase::SupabaseRpcClient;

/// Conditions that stop the process before the first turn.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("embedding model produces {got}-dimensional vectors but the index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("failed to initialise search client: {0}")]
    Search(#[from] RetrieveError),

    #[error("failed to initialise generation client: {0}")]
    Generation(#[from] GenerateError),
}

pub type LiveSession<E> = ChatSession<E, SupabaseRpcClient, GeminiClient>;

/// Build a session talking to Supabase and Gemini. The embedder is loaded by
/// the caller so tests and diagnostics can substitute their own.
pub fn connect_session<E: EmbeddingProvider>(
    config: &Config,
    secrets: &Secrets,
    embedder: E,
) -> Result<LiveSession<E>, StartupError> {
    let expected = config.embedding.dimension();
    if embedder.dimension() != expected {
        return Err(StartupError::DimensionMismatch {
            expected,
            got: embedder.dimension(),
        });
    }

    let search = SupabaseRpcClient::new(
        &secrets.supabase_url,
        &secrets.supabase_key,
        &config.retrieval.rpc_function,
        config.retrieval.vector_encoding,
    )?;
    let generator = GeminiClient::new(
        &config.generation.base_url,
        &config.generation.model,
        &secrets.gemini_api_key,
    )?;
    info!(
        search = %search.endpoint(),
        generation = %generator.endpoint(),
        match_count = config.retrieval.match_count.get(),
        "services configured"
    );

    let retriever = Retriever::new(search, config.retrieval.context_delimiter.clone(), expected);
    let answerer = Answerer::new(generator, PromptTemplate::new(config.prompt.persona.clone()));
    Ok(ChatSession::new(
        embedder,
        retriever,
        answerer,
        config.retrieval.match_count,
    ))
}
