//! 全局常量定义

/// OpenRouter API 相关常量
pub mod api {
    /// OpenRouter API base URL
    pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

    /// Chat completions endpoint suffix
    pub const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";

    /// Models listing endpoint suffix
    pub const MODELS_SUFFIX: &str = "/models";

    /// Model used by connection probes (cheap, widely available)
    pub const PROBE_MODEL: &str = "openai/gpt-3.5-turbo";
}

/// API key 存储与校验常量
pub mod store {
    /// Settings key holding the OpenRouter API key
    pub const API_KEY_NAME: &str = "openrouter_api_key";

    /// Required key prefix issued by OpenRouter
    pub const API_KEY_PREFIX: &str = "sk-or-v1-";

    /// Minimum plausible API key length
    pub const API_KEY_MIN_LENGTH: usize = 20;

    /// Values that mean "no key configured" rather than a real credential
    pub const PLACEHOLDER_KEYS: &[&str] = &["", "your_openrouter_api_key_here", "undefined", "null"];
}

/// LLM 请求相关常量
pub mod llm {
    /// Default max_tokens for plain chat requests
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    /// max_tokens for full workout generation
    pub const WORKOUT_MAX_TOKENS: u32 = 3000;

    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Temperature for the creative persona
    pub const CREATIVE_TEMPERATURE: f32 = 0.8;

    /// Default nucleus sampling value
    pub const DEFAULT_TOP_P: f32 = 0.9;
}

/// 响应解析相关常量
pub mod parser {
    /// Max length of the raw-text excerpt attached to parse errors
    pub const ERROR_PREVIEW_LENGTH: usize = 500;

    /// Repair passes after direct extraction (light + aggressive)
    pub const MAX_REPAIR_PASSES: usize = 2;
}

/// 重试相关常量
pub mod retry {
    /// Upper bound for any computed backoff delay
    pub const MAX_BACKOFF_MS: u64 = 60_000;

    /// Upper bound for added jitter
    pub const MAX_JITTER_MS: u64 = 1_000;

    /// Attempts never sleep less than this between tries
    pub const MIN_RETRY_DELAY_MS: u64 = 100;

    /// Rate-limited requests retry at most once
    pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 2;
}
