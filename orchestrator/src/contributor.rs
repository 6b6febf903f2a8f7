//! Contributors produce role-specific text for a stage
//!
//! A contributor reads the request and the current draft and returns text.
//! It must not rely on mutable shared state: one contributor may serve
//! several sessions at once.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::error::{DraftError, DraftResult};
use crate::request::SpeechRequest;
use crate::role::Role;

/// Trait for role contributors
#[async_trait]
pub trait Contributor: Send + Sync {
    /// Produce this role's text for the given request and draft
    async fn generate(&self, request: &SpeechRequest, draft: &Draft) -> Result<String>;
}

/// Deterministic stub contributor
///
/// Produces `"[<Display Name>] suggestion based on <occasion> / <audience>"`.
#[derive(Debug, Clone)]
pub struct TemplateContributor {
    label: String,
}

impl TemplateContributor {
    pub fn new(role: Role) -> Self {
        Self {
            label: role.display_name().to_string(),
        }
    }

    /// Use a custom label instead of the role's display name
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl Contributor for TemplateContributor {
    async fn generate(&self, request: &SpeechRequest, _draft: &Draft) -> Result<String> {
        Ok(format!(
            "[{}] suggestion based on {} / {}",
            self.label, request.occasion, request.audience
        ))
    }
}

type GenerateFn = dyn Fn(&SpeechRequest, &Draft) -> Result<String> + Send + Sync;

/// Contributor backed by a closure, for injecting fakes
#[derive(Clone)]
pub struct FnContributor {
    func: Arc<GenerateFn>,
}

impl FnContributor {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&SpeechRequest, &Draft) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Contributor that always returns `text`
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Contributor that always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_, _| Err(anyhow!(message.clone())))
    }
}

impl std::fmt::Debug for FnContributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnContributor").finish_non_exhaustive()
    }
}

#[async_trait]
impl Contributor for FnContributor {
    async fn generate(&self, request: &SpeechRequest, draft: &Draft) -> Result<String> {
        (self.func)(request, draft)
    }
}

/// Render the request and current draft as a user prompt
pub fn render_brief(request: &SpeechRequest, draft: &Draft) -> String {
    let mut brief = String::new();
    brief.push_str(&format!("Occasion: {}\n", request.occasion));
    brief.push_str(&format!("Audience: {}\n", request.audience));
    brief.push_str(&format!("Tone: {}\n", request.tone));
    brief.push_str(&format!("Duration: {} minutes\n", request.duration_minutes));

    if !request.keywords.is_empty() {
        brief.push_str(&format!("Keywords: {}\n", request.keywords.join(", ")));
    }
    if !request.must_quote.is_empty() {
        brief.push_str("Must quote:\n");
        for quote in &request.must_quote {
            brief.push_str(&format!("- {}\n", quote));
        }
    }
    if !request.forbidden_terms.is_empty() {
        brief.push_str(&format!(
            "Forbidden terms: {}\n",
            request.forbidden_terms.join(", ")
        ));
    }
    if !request.references.is_empty() {
        brief.push_str("\n## Reference sources\n");
        for source in &request.references {
            brief.push_str(&format!("### {} ({})\n{}\n", source.name, source.kind, source.content));
        }
    }

    brief.push_str("\n## Current draft\n");
    if draft.text.is_empty() {
        brief.push_str("(empty - this is the first stage)\n");
    } else {
        brief.push_str(&draft.text);
        brief.push('\n');
    }

    brief
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

/// Contributor that calls an OpenAI-compatible chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatContributor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    temperature: f32,
}

impl ChatContributor {
    /// Create a chat contributor
    ///
    /// `base_url` is the API root (e.g. `https://api.deepseek.com/v1`).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> DraftResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DraftError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature: crate::config::default_temperature(),
        })
    }

    /// Set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Contributor for ChatContributor {
    async fn generate(&self, request: &SpeechRequest, draft: &Draft) -> Result<String> {
        let brief = render_brief(request, draft);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &brief,
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "Sending chat completion");

        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("empty response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::UploadedSource;

    fn request() -> SpeechRequest {
        SpeechRequest::new("Opening", "Staff", "formal", 5)
    }

    #[tokio::test]
    async fn test_template_contributor() {
        let contributor = TemplateContributor::new(Role::PolicyExpert);
        let text = contributor.generate(&request(), &Draft::new()).await.unwrap();
        assert_eq!(text, "[Policy Expert] suggestion based on Opening / Staff");
    }

    #[tokio::test]
    async fn test_fn_contributor_sees_draft() {
        let contributor = FnContributor::new(|_, draft| Ok(format!("len={}", draft.text.len())));
        let draft = Draft {
            text: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(contributor.generate(&request(), &draft).await.unwrap(), "len=3");

        let failing = FnContributor::failing("model offline");
        let err = failing.generate(&request(), &draft).await.unwrap_err();
        assert_eq!(err.to_string(), "model offline");
    }

    #[test]
    fn test_render_brief() {
        let request = request()
            .with_keywords(["growth", "trust"])
            .with_forbidden_terms(["miracle"])
            .with_reference(UploadedSource::new("annual report", "Output doubled.", "data"));

        let brief = render_brief(&request, &Draft::new());
        assert!(brief.contains("Keywords: growth, trust"));
        assert!(brief.contains("Forbidden terms: miracle"));
        assert!(brief.contains("### annual report (data)"));
        assert!(brief.contains("(empty - this is the first stage)"));
    }

    #[test]
    fn test_chat_endpoint() {
        let contributor = ChatContributor::new(
            "https://api.deepseek.com/v1/",
            "key",
            "deepseek-chat",
            "prompt",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_temperature(0.3);

        assert_eq!(
            contributor.endpoint(),
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(contributor.model(), "deepseek-chat");
    }

    #[test]
    fn test_chat_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }
}
