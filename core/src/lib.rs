//! Root of the `ragchat-core` library.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the CLI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod answerer;
pub mod config;
pub mod config_types;
pub mod conversation_history;
pub mod gemini;
pub mod orchestrator;
pub mod retriever;
pub mod secrets;
mod session_builder;
pub mod supabase;

pub use answerer::Answer;
pub use answerer::Answerer;
pub use answerer::GenerateError;
pub use answerer::PromptTemplate;
pub use answerer::TextGenerator;
pub use config::Config;
pub use config::ConfigError;
pub use config::ConfigOverrides;
pub use conversation_history::ConversationHistory;
pub use conversation_history::ConversationTurn;
pub use conversation_history::Role;
pub use gemini::GeminiClient;
pub use orchestrator::ChatSession;
pub use orchestrator::TurnOutcome;
pub use orchestrator::TurnPhase;
pub use orchestrator::TurnReport;
pub use retriever::MatchedChunk;
pub use retriever::RetrieveError;
pub use retriever::Retrieval;
pub use retriever::Retriever;
pub use retriever::VectorSearch;
pub use secrets::Secrets;
pub use session_builder::LiveSession;
pub use session_builder::StartupError;
pub use session_builder::connect_session;
pub use supabase::SupabaseRpcClient;
