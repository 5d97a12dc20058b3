use super::{
    CompletionRequest, CompletionResponse, LlmClient, LlmClientConfig, LlmError, Message,
    ResponseFormat,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

const ERROR_BODY_LIMIT: usize = 1000;

/// Client for any endpoint speaking the OpenAI chat-completions protocol
/// (OpenRouter, OpenAI, local gateways).
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: String,
}

impl OpenAiCompatibleClient {
    pub fn new(config: LlmClientConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let headers = build_headers(api_key, &config.default_headers)?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            endpoint: chat_completions_url(&config.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatRequest::from(&request);
        let started = Instant::now();

        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let completion = parse_chat_response(&text)?;
        tracing::info!(
            model = %request.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            finish_reason = completion.finish_reason.as_deref().unwrap_or("unknown"),
            "LLM completion received"
        );
        Ok(completion)
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn build_headers(
    api_key: &str,
    default_headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
        LlmError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
            reason: e.to_string(),
        }
    })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in default_headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| LlmError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| LlmError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> From<&'a CompletionRequest> for ChatRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        let response_format = match request.response_format {
            Some(ResponseFormat::JsonObject) => Some(ResponseFormatBody {
                kind: "json_object",
            }),
            Some(ResponseFormat::Text) | None => None,
        };

        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

fn parse_chat_response(body: &str) -> Result<CompletionResponse, LlmError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

    // OpenRouter reports some upstream failures inside a 200 response
    if let Some(error) = parsed.error {
        return Err(LlmError::Provider(
            error
                .message
                .unwrap_or_else(|| "unknown provider error".to_string()),
        ));
    }

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyCompletion)?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(LlmError::EmptyCompletion);
    }

    Ok(CompletionResponse {
        content,
        model: parsed.model,
        finish_reason: choice.finish_reason,
    })
}
