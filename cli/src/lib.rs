pub mod chat;
pub mod debug;
mod logging;
pub mod slash_command;

use std::num::NonZeroU32;

use clap::Parser;
use ragchat_core::Config;
use ragchat_core::ConfigOverrides;
use ragchat_core::LiveSession;
use ragchat_core::Secrets;
use ragchat_core::config::parse_override;
use ragchat_core::connect_session;
use ragchat_embedding::EmbeddingProvider;
use ragchat_embedding::HashEmbeddingProvider;
use ragchat_embedding::LocalEmbedder;
use toml::Value as TomlValue;
use tracing::info;

pub use logging::init_logging;

/// `-c key=value` overrides applied on top of `config.toml`.
#[derive(Debug, Parser, Default, Clone)]
pub struct CliConfigOverrides {
    /// Override a configuration value that would otherwise be loaded from
    /// `~/.ragchat/config.toml`. Use a dotted path (`retrieval.match_count`)
    /// to override nested values. The value is parsed as TOML; if that fails
    /// it is used as a literal string.
    ///
    /// Examples:
    ///   - `-c retrieval.vector_encoding=array`
    ///   - `-c generation.model=gemini-2.5-pro`
    #[arg(
        short = 'c',
        long = "config",
        value_name = "key=value",
        action = clap::ArgAction::Append,
        global = true,
    )]
    pub raw_overrides: Vec<String>,
}

impl CliConfigOverrides {
    pub fn parse_overrides(&self) -> anyhow::Result<Vec<(String, TomlValue)>> {
        self.raw_overrides
            .iter()
            .map(|raw| parse_override(raw).map_err(anyhow::Error::from))
            .collect()
    }
}

/// Flags shared by every command that runs a chat turn.
#[derive(Debug, Parser, Default, Clone)]
pub struct SessionArgs {
    /// Maximum number of chunks requested from the search RPC.
    #[arg(long = "match-count", value_name = "N", global = true)]
    pub match_count: Option<NonZeroU32>,

    /// Generation model identifier, e.g. `gemini-2.5-flash`.
    #[arg(long = "model", short = 'm', global = true)]
    pub model: Option<String>,

    /// Use deterministic hash embeddings instead of the local model. Only
    /// useful for exercising the pipeline; retrieval quality is meaningless.
    #[arg(long = "offline-embeddings", default_value_t = false, global = true)]
    pub offline_embeddings: bool,

    /// Write logs to stderr instead of `<home>/log/ragchat.log`.
    #[arg(long = "log-stderr", default_value_t = false, global = true)]
    pub log_stderr: bool,
}

pub fn load_config(overrides: &CliConfigOverrides, args: &SessionArgs) -> anyhow::Result<Config> {
    let cli_kv = overrides.parse_overrides()?;
    let config = Config::load_with_cli_overrides(
        cli_kv,
        ConfigOverrides {
            match_count: args.match_count,
            generation_model: args.model.clone(),
            ragchat_home: None,
        },
    )?;
    Ok(config)
}

/// Load the embedding model named by `config`, once, off the async runtime.
pub async fn load_embedder(
    config: &Config,
    offline: bool,
) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    if offline {
        info!("using offline hash embeddings");
        return Ok(Box::new(HashEmbeddingProvider::new(config.embedding.dimension())));
    }
    let opts = config.embedding.local_options();
    let embedder = tokio::task::spawn_blocking(move || LocalEmbedder::load(&opts)).await??;
    Ok(Box::new(embedder))
}

/// Everything needed before the first turn: secrets, model and clients.
/// Any failure here is fatal.
pub async fn start_session(
    config: &Config,
    args: &SessionArgs,
) -> anyhow::Result<LiveSession<Box<dyn EmbeddingProvider>>> {
    let secrets = Secrets::load(&config.ragchat_home)?;
    let embedder = load_embedder(config, args.offline_embeddings).await?;
    Ok(connect_session(config, &secrets, embedder)?)
}
