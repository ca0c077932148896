//! OpenRouter HTTP 传输层：按尝试预算执行请求并扁平化线上响应
//!
//! One [`OpenRouterClient`] owns one connection pool and one credential.
//! Every operation runs the local key check first, so an absent or
//! placeholder key never produces network traffic.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, NetworkConfig};
use crate::constants::api;
use crate::constants::llm::{DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
use crate::constants::retry::MAX_JITTER_MS;
use crate::error::{classify_error, ErrorKind, FitError, Result};
use crate::llm::retry;
use crate::llm::{ChatMessage, ChatOptions, ChatOutcome, ChatProvider, TokenUsage};
use crate::store;

/// POST /chat/completions 请求体（OpenAI 兼容格式，stream 恒为 false）
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// One row of the OpenRouter model listing, reduced to what callers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    /// Display name; falls back to the id when the API sends none.
    pub name: String,
    /// Vendor prefix of the id, `"unknown"` when the id has no prefix.
    pub provider: String,
}

impl From<ModelEntry> for ModelSummary {
    fn from(entry: ModelEntry) -> Self {
        let provider = entry
            .id
            .split('/')
            .next()
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let name = match entry.name {
            Some(name) if !name.is_empty() => name,
            _ => entry.id.clone(),
        };
        Self {
            id: entry.id,
            name,
            provider,
        }
    }
}

/// 单次请求的失败结果，连同服务器的等待提示一起交给退避决策
struct RequestFailure {
    error: FitError,
    retry_after_ms: Option<u64>,
}

impl RequestFailure {
    fn plain(error: FitError) -> Self {
        Self {
            error,
            retry_after_ms: None,
        }
    }
}

/// OpenRouter API 客户端
///
/// Construct one per credential. The orchestrator talks to it through the
/// [`ChatProvider`] seam; the diagnostic calls are inherent methods.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    site_url: String,
    title: String,
    network: NetworkConfig,
}

impl OpenRouterClient {
    /// Builds a client around one credential and the `[network]` settings.
    ///
    /// The key is not validated here. A bad key only surfaces when a call is
    /// attempted, so construction fails only when the HTTP client cannot be
    /// set up.
    pub fn new(api_key: impl Into<String>, config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "{}/{} ({})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ))
            .connect_timeout(Duration::from_secs(config.network.connect_timeout))
            .build()
            .map_err(|e| {
                FitError::Config(
                    rust_i18n::t!("client.http_init_failed", error = e.to_string()).to_string(),
                )
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: api::OPENROUTER_API_URL.to_string(),
            site_url: config.app.site_url.clone(),
            title: config.app.title.clone(),
            network: config.network.clone(),
        })
    }

    /// Redirects all traffic to a different endpoint. Test seam.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Local credential check per the stored-key rules. Never touches the
    /// network.
    pub fn has_usable_api_key(&self) -> bool {
        store::validate_api_key_format(&self.api_key).is_ok()
    }

    fn ensure_api_key(&self) -> Result<()> {
        if !self.has_usable_api_key() {
            tracing::warn!(
                api_key = %store::mask_api_key(&self.api_key),
                "refusing OpenRouter call without a usable API key"
            );
            return Err(FitError::MissingApiKey);
        }
        Ok(())
    }

    /// 1-token 探测请求，验证密钥与连通性，永不返回错误
    ///
    /// Single attempt against the chat endpoint with the probe timeout. Any
    /// failure, including a locally unusable key, reports `false`.
    pub async fn test_connection(&self) -> bool {
        if !self.has_usable_api_key() {
            tracing::warn!(
                api_key = %store::mask_api_key(&self.api_key),
                "connection probe skipped, api key unusable"
            );
            return false;
        }

        let messages = [ChatMessage::user("test")];
        let request = ChatRequest {
            model: api::PROBE_MODEL,
            messages: &messages,
            max_tokens: 1,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            stream: false,
        };
        let timeout = Duration::from_secs(self.network.probe_timeout);

        match self.post_chat(&request, timeout, 1).await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "connection probe failed");
                false
            }
        }
    }

    /// GET /models，映射为 {id, name, provider} 摘要列表
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        self.ensure_api_key()?;
        let timeout = Duration::from_secs(self.network.models_timeout);
        let response: ModelsResponse = self.get_json(api::MODELS_SUFFIX, timeout, 2).await?;
        Ok(response.data.into_iter().map(ModelSummary::from).collect())
    }

    /// Raw metadata for one model id, exactly as the API returns it.
    pub async fn model_info(&self, model_id: &str) -> Result<serde_json::Value> {
        self.ensure_api_key()?;
        let endpoint = format!("{}/{}", api::MODELS_SUFFIX, model_id);
        let timeout = Duration::from_secs(self.network.probe_timeout);
        self.get_json(&endpoint, timeout, 2).await
    }

    async fn post_chat(
        &self,
        request: &ChatRequest<'_>,
        timeout: Duration,
        max_attempts: u32,
    ) -> Result<ChatResponse> {
        self.execute(api::CHAT_COMPLETIONS_SUFFIX, timeout, max_attempts, || {
            self.request(Method::POST, api::CHAT_COMPLETIONS_SUFFIX)
                .json(request)
        })
        .await
    }

    async fn get_json<T>(&self, endpoint: &str, timeout: Duration, max_attempts: u32) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.execute(endpoint, timeout, max_attempts, || {
            self.request(Method::GET, endpoint)
        })
        .await
    }

    /// 构造带鉴权与来源头的请求
    fn request(&self, method: Method, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.title)
    }

    /// Attempt loop shared by every endpoint.
    ///
    /// 每次失败先分类并记录，再由重试策略决定是否继续。429 响应的
    /// Retry-After 提示优先于指数退避，两者都受 max_retry_delay_ms 上限。
    async fn execute<T, F>(
        &self,
        endpoint: &str,
        timeout: Duration,
        max_attempts: u32,
        build_request: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let failure = match self.try_once::<T>(build_request(), endpoint, timeout).await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            let classified = classify_error(
                &failure.error,
                vec![
                    ("endpoint".to_string(), endpoint.to_string()),
                    ("attempt".to_string(), attempt.to_string()),
                    ("max_attempts".to_string(), max_attempts.to_string()),
                    ("api_key".to_string(), store::mask_api_key(&self.api_key)),
                ],
            );
            classified.log();

            if !retry::should_retry(classified.kind, attempt, max_attempts) {
                return Err(classified.into());
            }

            let delay = self.backoff_delay(classified.kind, attempt, failure.retry_after_ms);
            tracing::debug!(
                endpoint,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn backoff_delay(
        &self,
        kind: ErrorKind,
        attempt: u32,
        retry_after_ms: Option<u64>,
    ) -> Duration {
        let cap = Duration::from_millis(self.network.max_retry_delay_ms);
        match retry_after_ms {
            Some(ms) => Duration::from_millis(ms).min(cap),
            None => {
                let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
                retry::retry_delay(kind, attempt, jitter).min(cap)
            }
        }
    }

    async fn try_once<T>(
        &self,
        builder: reqwest::RequestBuilder,
        endpoint: &str,
        timeout: Duration,
    ) -> std::result::Result<T, RequestFailure>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| RequestFailure::plain(FitError::Network(err)))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = retry_after_hint(&response, status);
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                rust_i18n::t!(
                    "client.request_failed",
                    endpoint = endpoint,
                    status = status.as_u16()
                )
                .to_string()
            } else {
                body
            };
            return Err(RequestFailure {
                error: FitError::Api {
                    status: status.as_u16(),
                    message,
                },
                retry_after_ms,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| RequestFailure::plain(FitError::Network(err)))
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatOutcome> {
        self.ensure_api_key()?;

        let request = ChatRequest {
            model: &options.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stream: false,
        };
        tracing::debug!(
            model = %options.model,
            max_tokens = options.max_tokens,
            temperature = options.temperature,
            message_count = messages.len(),
            "requesting chat completion"
        );

        let response = self
            .post_chat(&request, options.timeout, options.max_attempts)
            .await?;
        Ok(flatten_response(response))
    }
}

/// 取第一个 choice 的内容；模型名缺省补 "unknown"
fn flatten_response(response: ChatResponse) -> ChatOutcome {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .unwrap_or_default();
    ChatOutcome {
        content,
        model: response.model.unwrap_or_else(|| "unknown".to_string()),
        usage: response.usage,
    }
}

/// 仅在 429 时读取 Retry-After，换算为毫秒
fn retry_after_hint(response: &reqwest::Response, status: StatusCode) -> Option<u64> {
    if status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    let value = response.headers().get(header::RETRY_AFTER)?.to_str().ok()?;
    retry::parse_retry_after(value).map(|secs| secs.saturating_mul(1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::test_utils::ensure_crypto_provider;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    const TEST_KEY: &str = "sk-or-v1-0123456789abcdef0123456789";

    fn client_for(url: &str) -> OpenRouterClient {
        OpenRouterClient::new(TEST_KEY, &AppConfig::default())
            .unwrap()
            .with_base_url(url)
    }

    fn chat_options() -> ChatOptions {
        ChatOptions::from_config(&AppConfig::default())
    }

    // === 线上形状 ===

    #[test]
    fn test_chat_request_serializes_full_wire_shape() {
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("hello")];
        let request = ChatRequest {
            model: "openai/gpt-4",
            messages: &messages,
            max_tokens: 3000,
            temperature: 0.7,
            top_p: 0.9,
            stream: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "openai/gpt-4");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["max_tokens"], 3000);
        assert!(value["temperature"].is_number());
        assert!(value["top_p"].is_number());
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_model_summary_falls_back_on_missing_fields() {
        let named: ModelSummary = ModelEntry {
            id: "openai/gpt-4-turbo".to_string(),
            name: Some("GPT-4 Turbo".to_string()),
        }
        .into();
        assert_eq!(named.name, "GPT-4 Turbo");
        assert_eq!(named.provider, "openai");

        let bare: ModelSummary = ModelEntry {
            id: "mistral-large".to_string(),
            name: None,
        }
        .into();
        assert_eq!(bare.name, "mistral-large");
        assert_eq!(bare.provider, "mistral-large");

        let empty_name: ModelSummary = ModelEntry {
            id: "anthropic/claude-3-haiku".to_string(),
            name: Some(String::new()),
        }
        .into();
        assert_eq!(empty_name.name, "anthropic/claude-3-haiku");
        assert_eq!(empty_name.provider, "anthropic");
    }

    #[test]
    fn test_has_usable_api_key_rejects_placeholders() {
        let config = AppConfig::default();
        let good = OpenRouterClient::new(TEST_KEY, &config).unwrap();
        assert!(good.has_usable_api_key());

        for bad in [
            "",
            "your_openrouter_api_key_here",
            "undefined",
            "null",
            "sk-or-v1-short",
            "sk-proj-0123456789abcdef0123",
        ] {
            let client = OpenRouterClient::new(bad, &config).unwrap();
            assert!(!client.has_usable_api_key(), "{bad:?} should be unusable");
        }
    }

    // === 请求执行 ===

    #[tokio::test]
    async fn test_chat_completion_returns_first_choice() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "gen-123",
                    "model": "deepseek/deepseek-chat-v3.1:free",
                    "choices": [
                        {"message": {"role": "assistant", "content": "{\"workout\":{}}"}},
                        {"message": {"role": "assistant", "content": "second choice"}}
                    ],
                    "usage": {"prompt_tokens": 812, "completion_tokens": 64, "total_tokens": 876}
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let messages = [ChatMessage::user("hello")];
        let outcome = client
            .chat_completion(&messages, &chat_options())
            .await
            .unwrap();

        assert_eq!(outcome.content, r#"{"workout":{}}"#);
        assert_eq!(outcome.model, "deepseek/deepseek-chat-v3.1:free");
        assert_eq!(outcome.usage.unwrap().total_tokens, 876);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_completion_tolerates_empty_choices() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let messages = [ChatMessage::user("hello")];
        let outcome = client
            .chat_completion(&messages, &chat_options())
            .await
            .unwrap();

        assert_eq!(outcome.content, "");
        assert_eq!(outcome.model, "unknown");
        assert!(outcome.usage.is_none());
    }

    #[tokio::test]
    async fn test_chat_completion_classifies_auth_failure() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Invalid API key"}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let messages = [ChatMessage::user("hello")];
        let err = client
            .chat_completion(&messages, &chat_options())
            .await
            .unwrap_err();

        match err {
            FitError::Ai(classified) => {
                assert_eq!(classified.kind, ErrorKind::ApiKeyInvalid);
                assert_eq!(classified.status, Some(401));
                assert!(!classified.retryable());
            }
            other => panic!("expected classified error, got {other:?}"),
        }
        // 不可重试，恰好一次请求
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after_and_stops_after_second_attempt() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        // Retry-After: 0 keeps the retry immediate. Without the header the
        // rate-limit backoff would wait a full minute.
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body("rate limit exceeded")
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let messages = [ChatMessage::user("hello")];
        let err = client
            .chat_completion(&messages, &chat_options())
            .await
            .unwrap_err();

        match err {
            FitError::Ai(classified) => {
                assert_eq!(classified.kind, ErrorKind::RateLimit);
                assert_eq!(classified.status, Some(429));
            }
            other => panic!("expected classified error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_api_key_never_reaches_the_network() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let chat_mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;
        let models_mock = server.mock("GET", "/models").expect(0).create_async().await;

        let client = OpenRouterClient::new("your_openrouter_api_key_here", &AppConfig::default())
            .unwrap()
            .with_base_url(server.url());
        let messages = [ChatMessage::user("hello")];

        let err = client
            .chat_completion(&messages, &chat_options())
            .await
            .unwrap_err();
        assert!(matches!(err, FitError::MissingApiKey));

        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, FitError::MissingApiKey));

        assert!(!client.test_connection().await);

        chat_mock.assert_async().await;
        models_mock.assert_async().await;
    }

    // === 诊断 ===

    #[tokio::test]
    async fn test_connection_probe_reports_success() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"content": "ok"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        assert!(client.test_connection().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_probe_fails_without_retry() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        // 探测预算为单次尝试，500 也不再重试
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        assert!(!client.test_connection().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_models_maps_ids_and_providers() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [
                    {"id": "openai/gpt-4-turbo", "name": "GPT-4 Turbo", "context_length": 128000},
                    {"id": "anthropic/claude-3-haiku", "name": ""},
                    {"id": "mistral-large"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let models = client.list_models().await.unwrap();

        assert_eq!(
            models,
            vec![
                ModelSummary {
                    id: "openai/gpt-4-turbo".to_string(),
                    name: "GPT-4 Turbo".to_string(),
                    provider: "openai".to_string(),
                },
                ModelSummary {
                    id: "anthropic/claude-3-haiku".to_string(),
                    name: "anthropic/claude-3-haiku".to_string(),
                    provider: "anthropic".to_string(),
                },
                ModelSummary {
                    id: "mistral-large".to_string(),
                    name: "mistral-large".to_string(),
                    provider: "mistral-large".to_string(),
                },
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_model_info_returns_raw_payload() {
        ensure_crypto_provider();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/models/openai/gpt-4")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "openai/gpt-4", "context_length": 8192}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let info = client.model_info("openai/gpt-4").await.unwrap();

        assert_eq!(info["id"], "openai/gpt-4");
        assert_eq!(info["context_length"], 8192);
        mock.assert_async().await;
    }
}
