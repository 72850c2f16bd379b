//! Text-generation client.
//!
//! The [`TextGenerator`] trait decouples planning and code fixing from the
//! actual model backend. Tests use scripted generators that return
//! predetermined responses without touching the network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::io::config::Settings;

/// Black-box prompt → text service.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
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
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client (single user message per call).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client. Fails with a configuration error when the API key is absent,
    /// so the problem surfaces before any request is attempted.
    pub fn new(settings: &Settings) -> crate::error::Result<Self> {
        let api_key = settings.require_openai_key()?.to_string();
        let llm = &settings.config.llm;
        let builder = Client::builder();
        let builder = match llm.timeout_secs {
            Some(secs) => builder.timeout(Duration::from_secs(secs)),
            None => builder.timeout(None::<Duration>),
        };
        let http = builder.build().context("build llm http client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", llm.base_url.trim_end_matches('/')),
            api_key,
            model: llm.model.clone(),
            temperature: llm.temperature,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        }
    }
}

impl TextGenerator for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str) -> Result<String> {
        info!("sending prompt to llm");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!(
                "llm request failed with status {}: {}",
                status.as_u16(),
                body.trim()
            ));
        }

        let parsed: ChatResponse = response.json().context("decode llm response")?;
        let content = extract_content(parsed)?;
        debug!(response_bytes = content.len(), "llm responded");
        Ok(content)
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("llm response has no message content"))
}
