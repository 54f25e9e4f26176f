use std::num::NonZeroU32;

use ragchat_embedding::encode_vector_literal;
use reqwest::Client;
use reqwest::Url;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::config_types::VectorEncoding;
use crate::retriever::MatchedChunk;
use crate::retriever::RetrieveError;
use crate::retriever::VectorSearch;

/// Similarity search through a Supabase (PostgREST) database function.
///
/// Issues one `POST <project>/rest/v1/rpc/<function>` per query. The function
/// receives `query_embedding`, `match_count` and an empty `filter` object and
/// returns rows exposing a `content` column.
pub struct SupabaseRpcClient {
    http: Client,
    url: Url,
    api_key: String,
    encoding: VectorEncoding,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    query_embedding: QueryEmbedding<'a>,
    match_count: u32,
    filter: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum QueryEmbedding<'a> {
    Text(String),
    Array(&'a [f32]),
}

impl SupabaseRpcClient {
    pub fn new(
        project_url: &str,
        api_key: &str,
        rpc_function: &str,
        encoding: VectorEncoding,
    ) -> Result<Self, RetrieveError> {
        let base = project_url.trim_end_matches('/');
        let url = Url::parse(&format!("{base}/rest/v1/rpc/{rpc_function}"))
            .map_err(|e| RetrieveError::InvalidEndpoint(format!("{project_url}: {e}")))?;
        let http = Client::builder()
            .build()
            .map_err(|e| RetrieveError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url,
            api_key: api_key.to_string(),
            encoding,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    fn params<'a>(&self, embedding: &'a [f32], match_count: NonZeroU32) -> RpcParams<'a> {
        let query_embedding = match self.encoding {
            VectorEncoding::Text => QueryEmbedding::Text(encode_vector_literal(embedding)),
            VectorEncoding::Array => QueryEmbedding::Array(embedding),
        };
        RpcParams {
            query_embedding,
            match_count: match_count.get(),
            filter: Map::new(),
        }
    }
}

impl VectorSearch for SupabaseRpcClient {
    async fn search(
        &self,
        embedding: &[f32],
        match_count: NonZeroU32,
    ) -> Result<Vec<MatchedChunk>, RetrieveError> {
        let payload = self.params(embedding, match_count);
        debug!(url = %self.url, match_count = match_count.get(), encoding = %self.encoding, "calling search RPC");

        let resp = self
            .http
            .post(self.url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RetrieveError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RetrieveError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(RetrieveError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // A set-returning function with no rows can come back as `null`.
        let rows: Option<Vec<MatchedChunk>> =
            serde_json::from_str(&body).map_err(|e| RetrieveError::Decode(e.to_string()))?;
        Ok(rows.unwrap_or_default())
    }
}
