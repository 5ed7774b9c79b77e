//! OpenAI provider implementation

use async_trait::async_trait;
use parley_core::RetryPolicy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::convert::{
    from_openai_response, map_http_error, to_openai_image_request, to_openai_request,
};
use super::types::{OpenAIConfig, OpenAIImageResponse, OpenAIResponse};
use crate::client::{ChatReply, ChatRequest, CompletionClient};
use crate::error::{Error, Result};

pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
    retry: RetryPolicy,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            retry: RetryPolicy::completion(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env().ok_or(Error::MissingApiKey)?)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &error_text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionClient for OpenAIProvider {
    fn provider_id(&self) -> &str {
        "openai"
    }

    async fn chat_complete(&self, request: ChatRequest) -> Result<ChatReply> {
        let body = to_openai_request(&self.config, &request);
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            max_tokens = body.max_tokens,
            "Sending chat completion"
        );

        let body = &body;
        let reply = self
            .retry
            .run("chat_complete", || async move {
                let resp: OpenAIResponse = self.post("chat/completions", body).await?;
                from_openai_response(resp)
            })
            .await?;

        debug!(total_tokens = reply.total_tokens, "Chat completion received");
        Ok(reply)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let body = to_openai_image_request(&self.config, prompt);

        let body = &body;
        let url = self
            .retry
            .run("generate_image", || async move {
                let resp: OpenAIImageResponse = self.post("images/generations", body).await?;
                resp.data
                    .into_iter()
                    .find_map(|d| d.url)
                    .ok_or(Error::EmptyReply)
            })
            .await?;

        info!(prompt, "Image generated");
        Ok(url)
    }
}
