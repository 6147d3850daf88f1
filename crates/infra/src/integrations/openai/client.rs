//! OpenAI-compatible API client shared by the classifier, embedding and
//! response adapters

use aura_domain::{AuraError, LlmConfig};
use reqwest::header::RETRY_AFTER;
use reqwest::Method;
use tracing::{debug, instrument};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, EmbeddingRequest,
    EmbeddingResponse, OpenAIError, ResponseFormat,
};
use crate::http::HttpClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Chat completion options for a single call.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask for a `json_object` response.
    pub json: bool,
}

impl ChatOptions {
    /// Low temperature, JSON object output.
    pub const fn json() -> Self {
        Self { temperature: 0.1, max_tokens: Some(800), json: true }
    }

    /// Conversational free text.
    pub const fn text() -> Self {
        Self { temperature: 0.7, max_tokens: Some(400), json: false }
    }
}

/// OpenAI API client
pub struct OpenAIClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    embedding_model: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key (required)
    /// * `http_client` - HTTP client with retry logic
    pub fn new(api_key: String, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Build a client from configuration. Fails when no API key is set.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AuraError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AuraError::Config("llm.api_key is not set".into()))?;

        let http_client = HttpClient::from_config(config)?;

        Ok(Self::new(api_key.to_string(), http_client)
            .with_model(config.chat_model.clone())
            .with_embedding_model(config.embedding_model.clone())
            .with_base_url(config.base_url.clone()))
    }

    /// Use a different chat model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different embedding model
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Point the client at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Call the Chat Completions API and return the first choice's text.
    ///
    /// # Errors
    /// Returns `OpenAIError` for network failures, API errors, or a response
    /// without content
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<String, OpenAIError> {
        let request_payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options.json.then(ResponseFormat::json_object),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self.post(&url, &request_payload).await?;

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAIError::InvalidSchema(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &chat_response.usage {
            debug!(tokens = usage.total_tokens, "chat completion usage");
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| OpenAIError::InvalidSchema("Response contained no content".to_string()))
    }

    /// Call the Embeddings API for a single input.
    #[instrument(skip(self, input), fields(model = %self.embedding_model, chars = input.len()))]
    pub async fn embed(
        &self,
        input: &str,
        dimensions: Option<usize>,
    ) -> Result<Vec<f32>, OpenAIError> {
        let request_payload = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: input.to_string(),
            dimensions,
        };

        let url = format!("{}/embeddings", self.base_url);
        let response = self.post(&url, &request_payload).await?;

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            OpenAIError::InvalidSchema(format!("Failed to parse embedding response: {}", e))
        })?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| OpenAIError::InvalidSchema("Response contained no embedding".into()))
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<reqwest::Response, OpenAIError> {
        let request_builder = self
            .http_client
            .request(Method::POST, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(payload);

        // Execute with retry (handled by HttpClient)
        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            AuraError::Network(msg) | AuraError::Internal(msg) => OpenAIError::Network(msg),
            other => OpenAIError::Network(format!("HTTP error: {}", other)),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received OpenAI API response");

        if !status.is_success() {
            return Err(Self::handle_error_status(status.as_u16(), response).await);
        }

        Ok(response)
    }

    /// Handle HTTP error status codes
    async fn handle_error_status(status: u16, response: reqwest::Response) -> OpenAIError {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            401 | 403 => OpenAIError::Authentication(format!("Invalid API key ({})", status)),
            429 => OpenAIError::RateLimit(retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS)),
            _ => OpenAIError::Api { status, message },
        }
    }
}
