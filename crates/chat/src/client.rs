//! The model boundary: a narrow request/response trait plus the real
//! Anthropic-backed implementation. The trait exists so tests can
//! substitute a scripted model.

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::model::{ContentBlock, Message, MessagesRequest, MessagesResponse, ToolDefinition};
use reqwest::header;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// What came back from one model consultation.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

/// A requested tool invocation extracted from a reply.
#[derive(Debug, Clone)]
pub struct ToolUseRequest {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ModelReply {
    /// Tool invocation requests, in the order the model emitted them.
    pub fn tool_uses(&self) -> Vec<ToolUseRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolUseRequest {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Concatenated text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Opaque natural-language reasoning service: full context and tool
/// catalog in, text and/or tool requests out.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ChatError>;
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &ChatConfig, api_key: &str) -> Result<Self, ChatError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::HeaderName::from_static("x-api-key"),
            header::HeaderValue::from_str(api_key)
                .map_err(|_| ChatError::Config("invalid API key format".to_string()))?,
        );
        headers.insert(
            header::HeaderName::from_static("anthropic-version"),
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()?;

        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("/v1/messages"))
            .map_err(|e| ChatError::Config(format!("invalid base URL: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ChatError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.to_string(),
            // Deterministic tool selection.
            temperature: Some(0.0),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "consulting model"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::from_response(status.as_u16(), &body));
        }

        let body: MessagesResponse = response.json().await?;
        Ok(ModelReply {
            content: body.content,
            stop_reason: body.stop_reason,
        })
    }
}
