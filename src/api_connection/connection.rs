use dotenv::dotenv;
use reqwest::Client;
use serde_json::json;
use std::env;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, Provider,
    OPENROUTER_CHAT_URL, OPENROUTER_MODELS,
};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("API returned no usable content: {0}")]
    EmptyResponse(String),
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::openrouter_at(api_key_env_var_name, OPENROUTER_CHAT_URL)
    }

    /// Same provider pointed at a different chat-completions URL.
    pub fn openrouter_at(api_key_env_var_name: &str, chat_url: &str) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            chat_url: chat_url.to_string(),
            available_models: OPENROUTER_MODELS.to_vec(),
        }
    }

    fn upstream_for(&self, model: &str) -> Option<&'static str> {
        match self {
            Provider::OpenRouter {
                available_models, ..
            } => available_models
                .iter()
                .find(|m| m.model_name == model)
                .map(|m| m.model_source),
        }
    }

    pub async fn call_chat_completion(
        &self,
        client: &Client,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                chat_url,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let mut request_payload = serde_json::to_value(&request)?;

                // Pin known models to their upstream so the schema-capable backend is used.
                if let (Some(source), Some(obj)) =
                    (self.upstream_for(&request.model), request_payload.as_object_mut())
                {
                    obj.insert("provider".to_string(), json!({ "only": [source] }));
                }

                let site_url =
                    env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
                let app_name = env::var("APP_NAME").unwrap_or_else(|_| "RecipeFinder".to_string());

                debug!(model = %request.model, url = %chat_url, "sending chat completion");
                let response = client
                    .post(chat_url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request_payload)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

/// Pulls the first choice's text out of a completion, dropping a surrounding
/// markdown code fence if the model added one.
pub fn first_choice_content(response: &ChatCompletionResponse) -> Result<String, ApiConnectionError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| ApiConnectionError::EmptyResponse("no choices in response".to_string()))?;
    let content = strip_code_fence(&choice.message.content);
    if content.is_empty() {
        return Err(ApiConnectionError::EmptyResponse(
            "content was empty after stripping markdown".to_string(),
        ));
    }
    Ok(content.to_string())
}

pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    inner.strip_prefix("json").unwrap_or(inner).trim()
}
