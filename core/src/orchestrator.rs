//! One question in, one answer out.
//!
//! [`ChatSession`] sequences embed → retrieve → generate for each submitted
//! question and records the exchange in the session history. Every per-turn
//! failure is converted into a user-visible message; `submit` itself never
//! fails.

use std::num::NonZeroU32;

use ragchat_embedding::EmbeddingError;
use ragchat_embedding::EmbeddingProvider;
use strum_macros::Display;
use tracing::info;
use tracing::warn;

use crate::answerer::Answer;
use crate::answerer::Answerer;
use crate::answerer::GenerateError;
use crate::answerer::TextGenerator;
use crate::conversation_history::ConversationHistory;
use crate::retriever::Retrieval;
use crate::retriever::RetrieveError;
use crate::retriever::Retriever;
use crate::retriever::VectorSearch;

/// Shown in place of an answer when the store has nothing relevant.
pub const NO_CONTEXT_MESSAGE: &str =
    "I couldn't find any relevant context in the database to answer your question.";

pub const NO_CONTEXT_NOTICE: &str = "No relevant information found in the database.";

/// Shown in place of an answer when the search call itself failed.
pub const RETRIEVAL_FAILED_MESSAGE: &str =
    "I couldn't search the database right now, so I can't answer your question. Please try again.";

pub const EMBEDDING_FAILED_MESSAGE: &str =
    "I couldn't process your question, so I can't answer it. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TurnPhase {
    Idle,
    Embedding,
    Retrieving,
    Generating,
    Displayed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered,
    /// The model call failed; the shown message carries the error text.
    GenerationFailed(GenerateError),
    NoContext,
    RetrievalFailed(RetrieveError),
    EmbeddingFailed(EmbeddingError),
}

impl TurnOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TurnOutcome::Answered => "answered",
            TurnOutcome::GenerationFailed(_) => "generation_failed",
            TurnOutcome::NoContext => "no_context",
            TurnOutcome::RetrievalFailed(_) => "retrieval_failed",
            TurnOutcome::EmbeddingFailed(_) => "embedding_failed",
        }
    }
}

/// Everything the UI needs to render a finished turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub question: String,
    /// The assistant message appended to history.
    pub response: String,
    /// Informational banner to show alongside the response, if any.
    pub notice: Option<String>,
    pub outcome: TurnOutcome,
    /// Phases visited, in order, ending with [`TurnPhase::Displayed`].
    pub phases: Vec<TurnPhase>,
    pub chunk_count: usize,
}

pub struct ChatSession<E, S, G> {
    embedder: E,
    retriever: Retriever<S>,
    answerer: Answerer<G>,
    match_count: NonZeroU32,
    history: ConversationHistory,
    phase: TurnPhase,
}

impl<E, S, G> ChatSession<E, S, G>
where
    E: EmbeddingProvider,
    S: VectorSearch,
    G: TextGenerator,
{
    pub fn new(
        embedder: E,
        retriever: Retriever<S>,
        answerer: Answerer<G>,
        match_count: NonZeroU32,
    ) -> Self {
        Self {
            embedder,
            retriever,
            answerer,
            match_count,
            history: ConversationHistory::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn retriever(&self) -> &Retriever<S> {
        &self.retriever
    }

    pub fn answerer(&self) -> &Answerer<G> {
        &self.answerer
    }

    pub async fn submit(&mut self, question: &str) -> TurnReport {
        let mut phases = vec![TurnPhase::Idle];
        self.history.push_user(question);

        self.enter(TurnPhase::Embedding, &mut phases);
        let (response, notice, outcome, chunk_count) = match self.embedder.embed_one(question) {
            Err(err) => embedding_failed(err),
            Ok(vector) => {
                self.enter(TurnPhase::Retrieving, &mut phases);
                match self.retriever.retrieve(&vector, self.match_count).await {
                    Retrieval::Context(ctx) => {
                        self.enter(TurnPhase::Generating, &mut phases);
                        let count = ctx.chunk_count();
                        match self.answerer.answer(question, &ctx.text).await {
                            Answer::Generated(text) => (text, None, TurnOutcome::Answered, count),
                            Answer::Failed { message, error } => {
                                (message, None, TurnOutcome::GenerationFailed(error), count)
                            }
                        }
                    }
                    Retrieval::EmptyMatches => (
                        NO_CONTEXT_MESSAGE.to_string(),
                        Some(NO_CONTEXT_NOTICE.to_string()),
                        TurnOutcome::NoContext,
                        0,
                    ),
                    Retrieval::CallFailed(err) => (
                        RETRIEVAL_FAILED_MESSAGE.to_string(),
                        Some(format!("Error during the database search: {err}")),
                        TurnOutcome::RetrievalFailed(err),
                        0,
                    ),
                }
            }
        };

        self.enter(TurnPhase::Displayed, &mut phases);
        self.history.push_assistant(response.clone());
        info!(
            outcome = outcome.label(),
            chunks = chunk_count,
            history_len = self.history.len(),
            "turn complete"
        );
        self.phase = TurnPhase::Idle;

        TurnReport {
            question: question.to_string(),
            response,
            notice,
            outcome,
            phases,
            chunk_count,
        }
    }

    fn enter(&mut self, phase: TurnPhase, phases: &mut Vec<TurnPhase>) {
        self.phase = phase;
        phases.push(phase);
    }
}

fn embedding_failed(err: EmbeddingError) -> (String, Option<String>, TurnOutcome, usize) {
    warn!("embedding failed: {err}");
    (
        EMBEDDING_FAILED_MESSAGE.to_string(),
        Some(format!("Error while embedding the question: {err}")),
        TurnOutcome::EmbeddingFailed(err),
        0,
    )
}
