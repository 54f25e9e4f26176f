use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::ConfigError;

pub const GEMINI_API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const SUPABASE_URL_ENV_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV_VAR: &str = "SUPABASE_KEY";

const SECRETS_TOML_FILE: &str = "secrets.toml";

/// Credentials for the generation and search services. All three are
/// required; the process refuses to start without them.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub gemini_api_key: String,
    pub supabase_url: String,
    pub supabase_key: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &"<redacted>")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read each secret from the environment, falling back to
    /// `<home>/secrets.toml` (flat `NAME = "value"` pairs).
    pub fn load(ragchat_home: &Path) -> Result<Self, ConfigError> {
        let file = read_secrets_file(ragchat_home)?;
        Self::from_sources(|name| std::env::var(name).ok(), &file)
    }

    /// A blank `env` value does not shadow the file entry of the same name.
    fn from_sources(
        env: impl Fn(&str) -> Option<String>,
        file: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| {
            env(name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.get(name).cloned())
        })
    }

    /// Resolve secrets through `lookup`. Blank values count as missing; the
    /// first missing name is reported.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSecret { name })
        };

        Ok(Self {
            gemini_api_key: require(GEMINI_API_KEY_ENV_VAR)?,
            supabase_url: require(SUPABASE_URL_ENV_VAR)?,
            supabase_key: require(SUPABASE_KEY_ENV_VAR)?,
        })
    }
}

fn read_secrets_file(ragchat_home: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let path = ragchat_home.join(SECRETS_TOML_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    debug!("reading secrets from {}", path.display());
    toml::from_str::<HashMap<String, String>>(&contents)
        .map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn all_present_resolves() {
        let secrets = Secrets::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "g-key"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_KEY", " s-key "),
        ]))
        .unwrap();
        assert_eq!(secrets.gemini_api_key, "g-key");
        assert_eq!(secrets.supabase_key, "s-key");
    }

    #[test]
    fn missing_value_is_reported_by_name() {
        let err = Secrets::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "g-key"),
            ("SUPABASE_KEY", "s-key"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { name: "SUPABASE_URL" }));
        assert!(err.to_string().contains("SUPABASE_URL"));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let err = Secrets::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "   "),
            ("SUPABASE_URL", "u"),
            ("SUPABASE_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { name: "GEMINI_API_KEY" }));
    }

    #[test]
    fn secrets_file_is_read() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join("secrets.toml"),
            "GEMINI_API_KEY = \"a\"\nSUPABASE_URL = \"b\"\nSUPABASE_KEY = \"c\"\n",
        )
        .unwrap();
        let file = read_secrets_file(home.path()).unwrap();
        let secrets = Secrets::from_lookup(|name| file.get(name).cloned()).unwrap();
        assert_eq!(secrets.supabase_url, "b");
    }

    #[test]
    fn blank_env_value_falls_back_to_file() {
        let file: HashMap<String, String> = [
            ("GEMINI_API_KEY", "from-file"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_KEY", "file-key"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = lookup_from(&[("GEMINI_API_KEY", ""), ("SUPABASE_KEY", "env-key")]);

        let secrets = Secrets::from_sources(env, &file).unwrap();
        assert_eq!(secrets.gemini_api_key, "from-file");
        assert_eq!(secrets.supabase_key, "env-key");
    }

    #[test]
    fn blank_env_value_without_file_entry_is_missing() {
        let env = lookup_from(&[
            ("GEMINI_API_KEY", " "),
            ("SUPABASE_URL", "u"),
            ("SUPABASE_KEY", "k"),
        ]);
        let err = Secrets::from_sources(env, &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { name: "GEMINI_API_KEY" }));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let secrets = Secrets {
            gemini_api_key: "very-secret".to_string(),
            supabase_url: "https://x.supabase.co".to_string(),
            supabase_key: "also-secret".to_string(),
        };
        let dbg = format!("{secrets:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(!dbg.contains("also-secret"));
        assert!(dbg.contains("https://x.supabase.co"));
    }
}
