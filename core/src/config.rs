use std::num::NonZeroU32;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use toml::Value as TomlValue;
use tracing::debug;

use crate::config_types::EmbeddingConfig;
use crate::config_types::GenerationConfig;
use crate::config_types::PromptConfig;
use crate::config_types::RetrievalConfig;

const CONFIG_TOML_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required secret `{name}`; set it in the environment or in secrets.toml")]
    MissingSecret { name: &'static str },

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("invalid override `{0}`: expected key=value")]
    InvalidOverride(String),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Base config deserialized from `<home>/config.toml`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConfigToml {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
}

/// Optional overrides coming from dedicated CLI flags. These take precedence
/// over both `config.toml` and `-c key=value` overrides.
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub match_count: Option<NonZeroU32>,
    pub generation_model: Option<String>,
    pub ragchat_home: Option<PathBuf>,
}

/// Application configuration loaded from disk and merged with overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,

    /// Directory containing all ragchat state (defaults to `~/.ragchat`
    /// but can be overridden by the `RAGCHAT_HOME` environment variable).
    pub ragchat_home: PathBuf,
}

impl Config {
    /// Load `config.toml` from the ragchat home, apply the `-c key=value`
    /// overrides in order, then the typed overrides.
    pub fn load_with_cli_overrides(
        cli_overrides: Vec<(String, TomlValue)>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let ragchat_home = match &overrides.ragchat_home {
            Some(home) => home.clone(),
            None => find_ragchat_home()?,
        };

        let mut root = load_config_as_toml(&ragchat_home)?;
        for (path, value) in cli_overrides {
            apply_toml_override(&mut root, &path, value);
        }
        let cfg: ConfigToml = root.try_into()?;

        Ok(Self::load_from_base_config_with_overrides(
            cfg,
            overrides,
            ragchat_home,
        ))
    }

    /// Meant to be used exclusively for tests: `load_with_cli_overrides()`
    /// should be used in all other cases.
    pub fn load_from_base_config_with_overrides(
        cfg: ConfigToml,
        overrides: ConfigOverrides,
        ragchat_home: PathBuf,
    ) -> Self {
        let ConfigToml {
            mut retrieval,
            mut embedding,
            mut generation,
            prompt,
        } = cfg;

        if let Some(match_count) = overrides.match_count {
            retrieval.match_count = match_count;
        }
        if let Some(model) = overrides.generation_model {
            generation.model = model;
        }
        if embedding.cache_dir.is_none() {
            embedding.cache_dir = Some(ragchat_home.join("models"));
        }
        while generation.base_url.ends_with('/') {
            generation.base_url.pop();
        }

        Self {
            retrieval,
            embedding,
            generation,
            prompt,
            ragchat_home,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.ragchat_home.join("log")
    }
}

/// Read `config.toml` from `ragchat_home`; a missing file yields an empty table.
fn load_config_as_toml(ragchat_home: &Path) -> Result<TomlValue, ConfigError> {
    let path = ragchat_home.join(CONFIG_TOML_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            toml::from_str::<TomlValue>(&contents).map_err(|source| ConfigError::Parse { path, source })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found, using defaults", path.display());
            Ok(TomlValue::Table(Default::default()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a raw `key=value` override. The value is parsed as TOML; when that
/// fails it is taken as a literal string so `-c generation.model=gemini-pro`
/// works without quoting.
pub fn parse_override(raw: &str) -> Result<(String, TomlValue), ConfigError> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(ConfigError::InvalidOverride(raw.to_string()));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidOverride(raw.to_string()));
    }
    let value = value.trim();
    let parsed = toml::from_str::<TomlValue>(&format!("_v = {value}"))
        .ok()
        .and_then(|t| t.get("_v").cloned())
        .unwrap_or_else(|| TomlValue::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

/// Apply a single dotted-path override onto a TOML value, creating
/// intermediate tables as needed.
fn apply_toml_override(root: &mut TomlValue, path: &str, value: TomlValue) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;

    for (idx, segment) in segments.iter().enumerate() {
        let is_last = idx == segments.len() - 1;

        if !current.is_table() {
            *current = TomlValue::Table(Default::default());
        }
        let TomlValue::Table(table) = current else {
            return;
        };

        if is_last {
            table.insert((*segment).to_string(), value);
            return;
        }
        current = table
            .entry((*segment).to_string())
            .or_insert_with(|| TomlValue::Table(Default::default()));
    }
}

/// Returns the path to the ragchat configuration directory, which can be
/// specified by the `RAGCHAT_HOME` environment variable. If not set, defaults
/// to `~/.ragchat`.
///
/// - If `RAGCHAT_HOME` is set, the value is used as-is; the directory does
///   not have to exist yet.
/// - If `RAGCHAT_HOME` is not set, this function does not verify that the
///   directory exists.
pub fn find_ragchat_home() -> Result<PathBuf, ConfigError> {
    if let Ok(val) = std::env::var("RAGCHAT_HOME")
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val));
    }

    let mut p = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    p.push(".ragchat");
    Ok(p)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config_types::VectorEncoding;
    use pretty_assertions::assert_eq;
    use ragchat_embedding::CatalogModel;
    use tempfile::TempDir;

    fn load(home: &TempDir, raw: &[&str], overrides: ConfigOverrides) -> Result<Config, ConfigError> {
        let kv = raw
            .iter()
            .map(|r| parse_override(r))
            .collect::<Result<Vec<_>, _>>()?;
        Config::load_with_cli_overrides(
            kv,
            ConfigOverrides {
                ragchat_home: Some(home.path().to_path_buf()),
                ..overrides
            },
        )
    }

    #[test]
    fn defaults_apply_without_config_file() {
        let home = TempDir::new().unwrap();
        let cfg = load(&home, &[], ConfigOverrides::default()).unwrap();
        assert_eq!(cfg.retrieval.match_count.get(), 144);
        assert_eq!(cfg.retrieval.rpc_function, "final_rag_call");
        assert_eq!(cfg.retrieval.context_delimiter, "\n---\n");
        assert_eq!(cfg.retrieval.vector_encoding, VectorEncoding::Text);
        assert_eq!(cfg.generation.model, "gemini-2.5-flash");
        assert_eq!(cfg.embedding.dimension(), 768);
        assert_eq!(cfg.embedding.cache_dir, Some(home.path().join("models")));
    }

    #[test]
    fn config_file_values_are_read() {
        let home = TempDir::new().unwrap();
        std::fs::write(
            home.path().join("config.toml"),
            r#"
[retrieval]
match_count = 12
vector_encoding = "array"

[embedding]
model = "bge-small-en-v1.5"
"#,
        )
        .unwrap();
        let cfg = load(&home, &[], ConfigOverrides::default()).unwrap();
        assert_eq!(cfg.retrieval.match_count.get(), 12);
        assert_eq!(cfg.retrieval.rpc_function, "final_rag_call");
        assert_eq!(cfg.retrieval.vector_encoding, VectorEncoding::Array);
        assert_eq!(cfg.embedding.model, CatalogModel::BgeSmallEnV15);
        assert_eq!(cfg.embedding.dimension(), 384);
    }

    #[test]
    fn zero_match_count_is_rejected() {
        let home = TempDir::new().unwrap();
        let err = load(&home, &["retrieval.match_count=0"], ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err:?}");
    }

    #[test]
    fn typed_overrides_win_over_cli_overrides() {
        let home = TempDir::new().unwrap();
        let cfg = load(
            &home,
            &["retrieval.match_count=10", "generation.model=gemini-pro"],
            ConfigOverrides {
                match_count: NonZeroU32::new(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cfg.retrieval.match_count.get(), 3);
        assert_eq!(cfg.generation.model, "gemini-pro");
    }

    #[test]
    fn malformed_config_file_names_the_path() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join("config.toml"), "retrieval = [").unwrap();
        let err = load(&home, &[], ConfigOverrides::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("config.toml"), "{msg}");
    }

    #[test]
    fn parse_override_handles_strings_and_numbers() {
        let (k, v) = parse_override("retrieval.match_count=7").unwrap();
        assert_eq!(k, "retrieval.match_count");
        assert_eq!(v, TomlValue::Integer(7));

        let (_, v) = parse_override("prompt.persona=The Art of War").unwrap();
        assert_eq!(v, TomlValue::String("The Art of War".to_string()));

        assert!(matches!(
            parse_override("no-equals-sign"),
            Err(ConfigError::InvalidOverride(_))
        ));
    }

    #[test]
    fn apply_override_creates_nested_tables() {
        let mut root = TomlValue::Table(Default::default());
        apply_toml_override(&mut root, "a.b.c", TomlValue::Boolean(true));
        assert_eq!(root["a"]["b"]["c"], TomlValue::Boolean(true));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let mut cfg = ConfigToml::default();
        cfg.generation.base_url = "http://localhost:1234/v1beta/".to_string();
        let cfg = Config::load_from_base_config_with_overrides(
            cfg,
            ConfigOverrides::default(),
            PathBuf::from("/tmp/ragchat"),
        );
        assert_eq!(cfg.generation.base_url, "http://localhost:1234/v1beta");
    }
}
