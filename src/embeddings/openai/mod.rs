
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::RagError;
use crate::config::OpenAiConfig;

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Blocking client for the OpenAI embeddings and chat completion APIs
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    temperature: f32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// One turn of a conversation, in the wire format the chat API expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .with_context(|| format!("{API_KEY_ENV} environment variable is not set"))?;

        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid OpenAI API URL: {}", config.api_url))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key,
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            temperature: config.temperature,
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Generate an embedding for a single text input
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()])?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embeddings response was empty"))
    }

    /// Generate embeddings for multiple text inputs in one API call
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} text(s)", texts.len());

        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let url = self
            .base_url
            .join("/v1/embeddings")
            .context("Failed to build embeddings URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embeddings request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to generate embeddings")?;

        let response: EmbeddingsResponse =
            serde_json::from_str(&response_text).context("Failed to parse embeddings response")?;

        if response.data.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            ))
            .into());
        }

        let mut data = response.data;
        data.sort_by_key(|entry| entry.index);

        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|entry| entry.embedding).collect();

        debug!("Generated {} embedding(s)", embeddings.len());
        Ok(embeddings)
    }

    /// Run a chat completion over the given messages and return the answer text
    #[inline]
    pub fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!("Requesting chat completion for {} message(s)", messages.len());

        let request = ChatRequest {
            model: &self.chat_model,
            temperature: self.temperature,
            messages,
        };

        let url = self
            .base_url
            .join("/v1/chat/completions")
            .context("Failed to build chat completions URL")?;

        let request_json = serde_json::to_string(&request)
            .context("Failed to serialize chat completion request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to generate chat completion")?;

        let response: ChatResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completion response")?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Chat response contained no choices"))?;

        Ok(choice.message.content)
    }
}
