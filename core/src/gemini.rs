use reqwest::Client;
use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::answerer::GenerateError;
use crate::answerer::TextGenerator;

/// Client for the Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    url: Url,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// `base_url` is the API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self, GenerateError> {
        let base = base_url.trim_end_matches('/');
        let url = Url::parse(&format!("{base}/models/{model}:generateContent"))
            .map_err(|e| GenerateError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        let http = Client::builder()
            .build()
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Concatenate the text parts of the first candidate.
fn extract_text(resp: GenerateContentResponse) -> Result<String, GenerateError> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(GenerateError::NoCandidates {
            block_reason: resp.prompt_feedback.and_then(|f| f.block_reason),
        });
    };
    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() {
        return Err(GenerateError::EmptyResponse {
            finish_reason: candidate.finish_reason,
        });
    }
    Ok(text)
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let payload = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling generateContent");

        let resp = self
            .http
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GenerateError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| GenerateError::Decode(e.to_string()))?;
        extract_text(parsed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn endpoint_includes_model_and_method() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-2.5-flash",
            "k",
        )
        .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let payload = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn joins_parts_of_first_candidate() {
        let resp = parse(
            r#"{"candidates": [
                {"content": {"role": "model", "parts": [{"text": "All warfare "}, {"text": "is deception."}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]}"#,
        );
        assert_eq!(extract_text(resp).unwrap(), "All warfare is deception.");
    }

    #[test]
    fn blocked_prompt_reports_reason() {
        let resp = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert_eq!(
            extract_text(resp).unwrap_err(),
            GenerateError::NoCandidates {
                block_reason: Some("SAFETY".to_string())
            }
        );
    }

    #[test]
    fn candidate_without_text_is_empty_response() {
        let resp = parse(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#);
        assert_eq!(
            extract_text(resp).unwrap_err(),
            GenerateError::EmptyResponse {
                finish_reason: Some("MAX_TOKENS".to_string())
            }
        );
    }
}
