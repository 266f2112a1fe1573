use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::debug;

use crate::utils::error::AppError;

/// OpenRouter speaks the OpenAI wire protocol.
const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Completion timeout (seconds).
const LLM_TIMEOUT_SECS: u64 = 25;

/// Classify a provider error into a typed `AppError`.
fn classify_llm_error(error: OpenAIError) -> AppError {
    match &error {
        OpenAIError::ApiError(api_err) => {
            let err_type = api_err.r#type.as_deref().unwrap_or("");
            let message = &api_err.message;

            // Error codes may arrive as JSON values; normalize to a string.
            let err_code = api_err
                .code
                .as_ref()
                .map(|v| v.as_str())
                .unwrap_or("");

            if err_type == "invalid_request_error"
                && (err_code == "invalid_api_key" || message.contains("API key"))
            {
                AppError::LlmAuthError
            } else if err_type == "rate_limit_error"
                || err_code == "rate_limit_exceeded"
                || message.contains("rate limit")
            {
                AppError::LlmRateLimited
            } else if err_type == "server_error"
                || err_code.contains("server")
                || message.contains("server")
            {
                AppError::LlmTemporaryError
            } else {
                AppError::LlmError(message.clone())
            }
        }
        OpenAIError::Reqwest(req_err) => {
            if req_err.is_timeout() || req_err.is_connect() {
                AppError::LlmTemporaryError
            } else if req_err.status().map(|s| s.as_u16()) == Some(401) {
                AppError::LlmAuthError
            } else if req_err.status().map(|s| s.as_u16()) == Some(429) {
                AppError::LlmRateLimited
            } else if req_err
                .status()
                .map(|s| s.is_server_error())
                .unwrap_or(false)
            {
                AppError::LlmTemporaryError
            } else {
                AppError::LlmError(req_err.to_string())
            }
        }
        _ => AppError::LlmError(error.to_string()),
    }
}

/// LLM client interface, mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AiClientTrait: Send + Sync {
    /// Run a chat completion and return the text of the first choice.
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        model: &str,
        caller_tag: &str,
    ) -> Result<String, AppError>;
}

/// Arc-wrapped client (Clone support).
pub type AiClient = Arc<dyn AiClientTrait>;

/// OpenRouter-backed implementation.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client<OpenAIConfig>,
}

impl OpenRouterClient {
    pub fn new(api_key: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(OPENROUTER_API_BASE)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait::async_trait]
impl AiClientTrait for OpenRouterClient {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        model: &str,
        caller_tag: &str,
    ) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let response = tokio::time::timeout(
            Duration::from_secs(LLM_TIMEOUT_SECS),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| AppError::LlmTemporaryError)?
        .map_err(classify_llm_error)?;

        debug!(caller_tag, model, "LLM completion succeeded");

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

pub(crate) fn build_system_message(
    content: &str,
) -> Result<ChatCompletionRequestMessage, AppError> {
    Ok(ChatCompletionRequestMessage::System(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?,
    ))
}

pub(crate) fn build_user_message(content: &str) -> Result<ChatCompletionRequestMessage, AppError> {
    Ok(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_openrouter_client() {
        let client = OpenRouterClient::new("test-api-key");
        assert!(std::mem::size_of_val(&client) > 0);
    }

    #[test]
    fn should_build_system_message() {
        let result = build_system_message("test prompt");
        assert!(result.is_ok());
    }

    #[test]
    fn should_build_user_message() {
        let result = build_user_message("test content");
        assert!(result.is_ok());
    }
}
