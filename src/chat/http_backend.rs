use super::ChatProvider;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::openai_backend::OpenAiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat provider backed by an OpenAI-compatible `/chat/completions` endpoint.
///
/// Each completion is a single attempt.
pub struct HttpChatProvider {
    client: OpenAiClient,
}

impl HttpChatProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.api_base_url,
            &config.api_key,
            config.request_timeout(),
        )?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let parsed: ChatResponse = self
            .client
            .post_json("chat/completions", &request, 0, Error::Generation)
            .await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Generation("Chat completion returned no content".to_string()))
    }
}
