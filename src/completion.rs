//! Minimal client for an OpenAI-compatible chat-completions endpoint.
//!
//! Used by the OCR, mnemonic-plan, and lyric-generation steps. Each call is
//! a single synchronous request/response; there is no retry or state here.

use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{Settings, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::error::MelodyError;
use crate::provider::{bearer_client, parse_base_url, snippet};

/// A single message in the conversation history.
#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

/// Message content is either plain text or a list of typed parts; the
/// latter carries image attachments for vision requests.
#[derive(Serialize, Debug)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Debug)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for `POST {base}/chat/completions` with bearer auth.
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: Url,
    model: String,
}

impl CompletionClient {
    /// Creates a new client, falling back to the `OPENAI_API_KEY`
    /// environment variable when `api_key` is `None`.
    pub fn new(api_key: Option<String>) -> Result<Self, MelodyError> {
        let api_key = api_key
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .ok_or(MelodyError::MissingApiKey)?;
        Self::new_with_url(api_key, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL)
    }

    /// Creates a new client against a custom base URL, e.g. a mock server.
    pub fn new_with_url(
        api_key: String,
        base_url: &str,
        model: &str,
    ) -> Result<Self, MelodyError> {
        Ok(Self {
            client: bearer_client(&api_key)?,
            base_url: parse_base_url(base_url)?,
            model: model.to_string(),
        })
    }

    /// Builds a client from [`Settings`], which must carry an OpenAI key.
    pub fn from_settings(settings: &Settings) -> Result<Self, MelodyError> {
        let key = settings
            .openai_api_key
            .clone()
            .ok_or(MelodyError::MissingApiKey)?;
        Self::new_with_url(key, &settings.openai_base_url, &settings.openai_model)
    }

    /// One text-only completion; returns the assistant reply, trimmed.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, MelodyError> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(system),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Text(user),
            },
        ];
        self.send(messages, temperature).await
    }

    /// One vision completion: the prompt plus a base64 image as a `data:`
    /// URL content part.
    pub async fn complete_with_image(
        &self,
        system: &str,
        prompt: &str,
        image_b64: &str,
        mime: &str,
        temperature: f32,
    ) -> Result<String, MelodyError> {
        let messages = vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(system),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{mime};base64,{image_b64}"),
                        },
                    },
                ]),
            },
        ];
        self.send(messages, temperature).await
    }

    async fn send(
        &self,
        messages: Vec<ChatMessage<'_>>,
        temperature: f32,
    ) -> Result<String, MelodyError> {
        let url = self.base_url.join("chat/completions")?;
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let response = self.client.post(url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MelodyError::Completion {
                message: format!("HTTP {status}: {}", snippet(&body)),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MelodyError::Completion {
                message: "response carried no choices".to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}
