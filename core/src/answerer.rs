use std::future::Future;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerateError {
    #[error("invalid generation endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("generation API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("could not decode generation response: {0}")]
    Decode(String),

    #[error("model returned no candidates{}", parenthesized("blocked", .block_reason))]
    NoCandidates { block_reason: Option<String> },

    #[error("model returned an empty answer{}", parenthesized("finish reason", .finish_reason))]
    EmptyResponse { finish_reason: Option<String> },
}

fn parenthesized(label: &str, reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({label}: {r})"))
        .unwrap_or_default()
}

/// A single non-streaming call to a generative model.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerateError>> + Send;
}

/// Fixed grounding template: persona framing, answer-only-from-context and
/// refusal instructions, then the literal context and question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    persona: String,
}

impl PromptTemplate {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn render(&self, question: &str, context: &str) -> String {
        format!(
            "You are an expert on {persona}. \
             Use only the provided context to answer the question. \
             If the context does not contain the answer, say that you cannot answer based on the information provided.\n\n\
             Context: \"{context}\"\n\n\
             Question: {question}",
            persona = self.persona,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Model output, unmodified.
    Generated(String),
    /// The call failed; `message` is shown to the user in place of an answer.
    Failed { message: String, error: GenerateError },
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::Failed { message, .. } => message,
        }
    }
}

pub struct Answerer<G> {
    generator: G,
    template: PromptTemplate,
}

impl<G: TextGenerator> Answerer<G> {
    pub fn new(generator: G, template: PromptTemplate) -> Self {
        Self {
            generator,
            template,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Never fails: generation errors come back as [`Answer::Failed`] with a
    /// user-visible message.
    pub async fn answer(&self, question: &str, context: &str) -> Answer {
        let prompt = self.template.render(question, context);
        match self.generator.generate(&prompt).await {
            Ok(text) => Answer::Generated(text),
            Err(error) => {
                warn!("generation failed: {error}");
                Answer::Failed {
                    message: format!("Error generating a response: {error}"),
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct Recorder {
        reply: Result<String, GenerateError>,
        prompts: Mutex<Vec<String>>,
    }

    impl TextGenerator for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn recorder(reply: Result<String, GenerateError>) -> Recorder {
        Recorder {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn prompt_contains_question_and_context_verbatim() {
        let template = PromptTemplate::new("Sun Tzu's The Art of War");
        let question = "What is the nature of deception in warfare?";
        let context = "All warfare is based on deception.\n---\n\"Quoted\" text";
        let prompt = template.render(question, context);
        assert!(prompt.contains(question));
        assert!(prompt.contains(context));
        assert!(prompt.starts_with("You are an expert on Sun Tzu's The Art of War."));
        assert!(prompt.contains("Use only the provided context"));
        assert!(prompt.contains("cannot answer based on the information provided"));
    }

    #[test]
    fn prompt_keeps_empty_inputs() {
        let prompt = PromptTemplate::new("x").render("", "");
        assert!(prompt.contains("Context: \"\""));
        assert!(prompt.ends_with("Question: "));
    }

    #[tokio::test]
    async fn generated_text_is_passed_through_unmodified() {
        let answerer = Answerer::new(
            recorder(Ok("  Deception is the basis of war.\n".to_string())),
            PromptTemplate::new("Sun Tzu"),
        );
        let answer = answerer.answer("q?", "ctx").await;
        assert_eq!(answer, Answer::Generated("  Deception is the basis of war.\n".to_string()));

        let prompts = answerer.generator().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], answerer.template().render("q?", "ctx"));
    }

    #[tokio::test]
    async fn failure_degrades_to_message() {
        let answerer = Answerer::new(
            recorder(Err(GenerateError::Http {
                status: 503,
                body: "overloaded".to_string(),
            })),
            PromptTemplate::new("Sun Tzu"),
        );
        let answer = answerer.answer("q?", "ctx").await;
        assert!(matches!(answer, Answer::Failed { .. }));
        assert_eq!(
            answer.text(),
            "Error generating a response: generation API returned HTTP 503: overloaded"
        );
    }

    #[test]
    fn no_candidates_mentions_block_reason() {
        let err = GenerateError::NoCandidates {
            block_reason: Some("SAFETY".to_string()),
        };
        assert_eq!(err.to_string(), "model returned no candidates (blocked: SAFETY)");
        let err = GenerateError::NoCandidates { block_reason: None };
        assert_eq!(err.to_string(), "model returned no candidates");
    }
}
