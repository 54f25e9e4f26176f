use ragchat_core::Config;
use ragchat_core::GeminiClient;
use ragchat_core::Secrets;
use ragchat_core::SupabaseRpcClient;
use ragchat_embedding::EmbeddingProvider;
use ragchat_embedding::cosine_similarity;
use serde_json::Value;
use serde_json::json;

/// Dimension and a short preview of the embedding of `text`, plus the cosine
/// similarity to `compare` when given.
pub fn embed_report(
    embedder: &dyn EmbeddingProvider,
    text: &str,
    compare: Option<&str>,
) -> anyhow::Result<Value> {
    let vector = embedder.embed_one(text)?;
    let preview: Vec<f32> = vector.iter().take(8).copied().collect();
    let mut report = json!({
        "dimension": vector.len(),
        "preview": preview,
    });
    if let Some(other) = compare {
        let other_vector = embedder.embed_one(other)?;
        report["cosine_similarity"] = json!(cosine_similarity(&vector, &other_vector));
    }
    Ok(report)
}

/// Resolved endpoints and parameters. Keys are never included; the Supabase
/// endpoint is shown only when its URL is configured.
pub fn inspect_report(config: &Config, secrets: Option<&Secrets>) -> anyhow::Result<Value> {
    let search_endpoint = match secrets {
        Some(s) => Some(
            SupabaseRpcClient::new(
                &s.supabase_url,
                "",
                &config.retrieval.rpc_function,
                config.retrieval.vector_encoding,
            )?
            .endpoint()
            .to_string(),
        ),
        None => None,
    };
    let generation = GeminiClient::new(&config.generation.base_url, &config.generation.model, "")?;

    Ok(json!({
        "ragchat_home": config.ragchat_home,
        "retrieval": {
            "endpoint": search_endpoint,
            "rpc_function": config.retrieval.rpc_function,
            "match_count": config.retrieval.match_count.get(),
            "context_delimiter": config.retrieval.context_delimiter,
            "vector_encoding": config.retrieval.vector_encoding,
        },
        "embedding": {
            "model": config.embedding.model,
            "model_dir": config.embedding.model_dir,
            "dimension": config.embedding.dimension(),
            "cache_dir": config.embedding.cache_dir,
        },
        "generation": {
            "endpoint": generation.endpoint().as_str(),
            "model": generation.model(),
        },
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ragchat_core::ConfigOverrides;
    use ragchat_core::config::ConfigToml;
    use ragchat_embedding::HashEmbeddingProvider;
    use std::path::PathBuf;

    #[test]
    fn embed_report_with_compare() {
        let embedder = HashEmbeddingProvider::new(32);
        let report = embed_report(&embedder, "attack", Some("attack")).unwrap();
        assert_eq!(report["dimension"], json!(32));
        assert_eq!(report["preview"].as_array().unwrap().len(), 8);
        let sim = report["cosine_similarity"].as_f64().unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn inspect_never_includes_keys() {
        let config = Config::load_from_base_config_with_overrides(
            ConfigToml::default(),
            ConfigOverrides::default(),
            PathBuf::from("/tmp/ragchat-home"),
        );
        let secrets = Secrets {
            gemini_api_key: "gemini-secret".to_string(),
            supabase_url: "https://abc.supabase.co".to_string(),
            supabase_key: "supabase-secret".to_string(),
        };
        let report = inspect_report(&config, Some(&secrets)).unwrap();
        let text = report.to_string();
        assert!(!text.contains("gemini-secret"));
        assert!(!text.contains("supabase-secret"));
        assert_eq!(
            report["retrieval"]["endpoint"],
            json!("https://abc.supabase.co/rest/v1/rpc/final_rag_call")
        );
        assert_eq!(report["retrieval"]["match_count"], json!(144));

        let without = inspect_report(&config, None).unwrap();
        assert_eq!(without["retrieval"]["endpoint"], Value::Null);
    }
}
