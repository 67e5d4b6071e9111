//! Chat-completions API client
//!
//! Direct HTTP client for the OpenAI-compatible chat-completions endpoint.
//! This is used by the cleaner to get structured JSON plans.

use crate::config::CleanerConfig;
use crate::cleaner::openai_types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat,
};
use crate::error::AppError;
use anyhow::anyhow;

/// Call the chat-completions API with a system and user prompt
///
/// Makes a direct HTTP request to the configured endpoint. When `force_json`
/// is set, the request asks for a `json_object` response format, which the
/// plan generator relies on.
///
/// # Arguments
/// * `client` - Shared HTTP client (connection pooling)
/// * `config` - Cleaner configuration (API key, model, base URL)
/// * `system` - System message content
/// * `prompt` - User message content
/// * `force_json` - If true, request JSON response format
///
/// # Returns
/// * `Ok(String)` - The assistant message content
/// * `Err(AppError)` - If the API key is missing, the HTTP request fails,
///   the response cannot be parsed, or the model refused the prompt.
pub async fn call_chat_api(
    client: &reqwest::Client,
    config: &CleanerConfig,
    system: &str,
    prompt: &str,
    force_json: bool,
) -> Result<String, AppError> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            AppError::Internal(anyhow!(
                "OPENAI_API_KEY environment variable is not set or is empty. Please set it to use data cleaning."
            ))
        })?;

    call_chat_api_with_base_url(
        client,
        api_key,
        &config.model,
        system,
        prompt,
        force_json,
        &config.base_url,
    )
    .await
}

/// Internal function that allows custom base URL (for testing)
async fn call_chat_api_with_base_url(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    system: &str,
    prompt: &str,
    force_json: bool,
    base_url: &str,
) -> Result<String, AppError> {
    let url = format!("{}/chat/completions", base_url);

    let request_body = ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ],
        temperature: Some(0.0),
        response_format: force_json.then(|| ResponseFormat {
            format_type: "json_object".to_string(),
        }),
    };

    tracing::debug!(
        url = %url,
        model = %model,
        force_json = force_json,
        prompt_len = prompt.len(),
        "Calling chat-completions API"
    );

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| {
            AppError::Internal(anyhow!(
                "Failed to send HTTP request to chat-completions API: {}",
                e
            ))
        })?;

    let status = response.status();
    if !status.is_success() {
        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        tracing::error!(
            status_code = status_code,
            error_body = %error_body,
            "Chat-completions API returned error status"
        );

        if status_code == 429 {
            return Err(AppError::Internal(anyhow!(
                "Chat-completions API rate limit exceeded (HTTP {}): {}",
                status_code,
                error_body
            )));
        }

        return Err(AppError::Internal(anyhow!(
            "Chat-completions API returned error status {}: {}",
            status_code,
            error_body
        )));
    }

    let response_body = response.text().await.map_err(|e| {
        AppError::Internal(anyhow!(
            "Failed to read response body from chat-completions API: {}",
            e
        ))
    })?;

    let parsed: ChatCompletionResponse = serde_json::from_str(&response_body).map_err(|e| {
        AppError::Internal(anyhow!(
            "Failed to parse JSON response from chat-completions API: {} - Response body: {}",
            e,
            response_body
        ))
    })?;

    let choice = parsed.choices.first().ok_or_else(|| {
        AppError::Internal(anyhow!("Chat-completions API response contains no choices"))
    })?;

    if let Some(refusal) = &choice.message.refusal {
        return Err(AppError::Internal(anyhow!(
            "Chat-completions API refused the prompt: {}",
            refusal
        )));
    }

    let text = choice
        .message
        .content
        .as_deref()
        .unwrap_or_default()
        .to_string();
    if text.is_empty() {
        return Err(AppError::Internal(anyhow!(
            "Chat-completions API response text is empty"
        )));
    }

    tracing::debug!(
        response_len = text.len(),
        finish_reason = ?choice.finish_reason,
        "Successfully received response from chat-completions API"
    );

    Ok(text)
}
