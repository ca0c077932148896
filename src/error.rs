use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FitError>;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Settings store error: {0}")]
    Store(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration parsing error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// 响应解析失败，附带解码器位置与原文摘录
    #[error("Failed to parse workout response: {message}")]
    Parse {
        message: String,
        position: Option<usize>,
        excerpt: String,
    },

    #[error("No API key configured")]
    MissingApiKey,

    /// 已分类的管线错误（带用户文案与重试信息）
    #[error("{0}")]
    Ai(Box<ClassifiedError>),

    /// 通用错误类型，用于不适合其他分类的错误
    #[error("{0}")]
    Other(String),
}

impl FitError {
    /// Classify this error with no extra diagnostic context.
    pub fn classify(&self) -> ClassifiedError {
        classify_error(self, Vec::new())
    }

    /// Localized message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            FitError::Ai(c) => c.user_message(),
            other => other.classify().user_message(),
        }
    }

    /// Localized, ordered list of actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            FitError::Ai(c) => c.suggestions(),
            other => other.classify().suggestions(),
        }
    }
}

impl From<ClassifiedError> for FitError {
    fn from(err: ClassifiedError) -> Self {
        FitError::Ai(Box::new(err))
    }
}

/// Failure categories of the generation pipeline.
///
/// Each kind carries a fixed severity, retryability and localized
/// presentation copy. New kinds require updating every exhaustive match
/// (retry policy, recovery actions), which is intentional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ApiKeyInvalid,
    ApiKeyMissing,
    Network,
    RateLimit,
    InsufficientCredits,
    ModelUnavailable,
    Timeout,
    Validation,
    Parsing,
    Server,
    Unknown,
}

impl ErrorKind {
    /// Stable identifier used in logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ApiKeyInvalid => "API_KEY_INVALID",
            ErrorKind::ApiKeyMissing => "API_KEY_MISSING",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::InsufficientCredits => "INSUFFICIENT_CREDITS",
            ErrorKind::ModelUnavailable => "MODEL_UNAVAILABLE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Parsing => "PARSING_ERROR",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ErrorKind::ApiKeyMissing => Severity::Critical,
            ErrorKind::ApiKeyInvalid | ErrorKind::InsufficientCredits | ErrorKind::Server => {
                Severity::High
            }
            ErrorKind::Network
            | ErrorKind::RateLimit
            | ErrorKind::ModelUnavailable
            | ErrorKind::Timeout
            | ErrorKind::Validation
            | ErrorKind::Parsing
            | ErrorKind::Unknown => Severity::Medium,
        }
    }

    /// Whether the transport may retry this kind at all.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Network
            | ErrorKind::RateLimit
            | ErrorKind::ModelUnavailable
            | ErrorKind::Timeout
            | ErrorKind::Parsing
            | ErrorKind::Server
            | ErrorKind::Unknown => true,
            ErrorKind::ApiKeyInvalid
            | ErrorKind::ApiKeyMissing
            | ErrorKind::InsufficientCredits
            | ErrorKind::Validation => false,
        }
    }

    /// Internal (non-localized) fallback message for this kind.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::ApiKeyInvalid => "Invalid API key provided",
            ErrorKind::ApiKeyMissing => "No API key configured",
            ErrorKind::Network => "Network connection failed",
            ErrorKind::RateLimit => "Rate limit exceeded",
            ErrorKind::InsufficientCredits => "Insufficient credits",
            ErrorKind::ModelUnavailable => "Selected model is unavailable",
            ErrorKind::Timeout => "Request timeout",
            ErrorKind::Validation => "Request validation failed",
            ErrorKind::Parsing => "Failed to parse AI response",
            ErrorKind::Server => "Server error occurred",
            ErrorKind::Unknown => "Unknown error occurred",
        }
    }

    fn locale_key(&self) -> &'static str {
        match self {
            ErrorKind::ApiKeyInvalid => "api_key_invalid",
            ErrorKind::ApiKeyMissing => "api_key_missing",
            ErrorKind::Network => "network",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::InsufficientCredits => "insufficient_credits",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Validation => "validation",
            ErrorKind::Parsing => "parsing",
            ErrorKind::Server => "server",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Localized user-facing message for this kind.
    pub fn user_message(&self) -> String {
        let key = format!("error.{}.user_message", self.locale_key());
        rust_i18n::t!(&key).to_string()
    }

    /// Localized suggestions, ordered by usefulness.
    pub fn suggestions(&self) -> Vec<String> {
        let count = match self {
            ErrorKind::ApiKeyMissing => 2,
            _ => 3,
        };
        (1..=count)
            .map(|i| {
                let key = format!("error.{}.s{}", self.locale_key(), i);
                rust_i18n::t!(&key).to_string()
            })
            .collect()
    }

    fn from_status(status: u16) -> Option<ErrorKind> {
        match status {
            401 => Some(ErrorKind::ApiKeyInvalid),
            403 => Some(ErrorKind::InsufficientCredits),
            404 => Some(ErrorKind::ModelUnavailable),
            422 => Some(ErrorKind::Validation),
            429 => Some(ErrorKind::RateLimit),
            500 | 502 | 503 | 504 => Some(ErrorKind::Server),
            _ => None,
        }
    }

    fn from_message(message: &str) -> Option<ErrorKind> {
        let msg = message.to_lowercase();
        if msg.contains("api key") || msg.contains("unauthorized") {
            Some(ErrorKind::ApiKeyInvalid)
        } else if msg.contains("rate limit") || msg.contains("too many requests") {
            Some(ErrorKind::RateLimit)
        } else if msg.contains("credits") || msg.contains("insufficient funds") {
            Some(ErrorKind::InsufficientCredits)
        } else if msg.contains("timeout") || msg.contains("timed out") {
            Some(ErrorKind::Timeout)
        } else if msg.contains("parse") || msg.contains("json") {
            Some(ErrorKind::Parsing)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation urgency of a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Numeric level for threshold comparisons.
    pub fn level(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing action a UI can offer for a failure.
///
/// The first entry returned by [`ClassifiedError::recovery_actions`] is the
/// primary action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    OpenSettings,
    ChooseOtherModel,
    TopUpCredits,
    Retry,
}

impl RecoveryAction {
    pub fn label(&self) -> String {
        let key = match self {
            RecoveryAction::OpenSettings => "recovery.open_settings",
            RecoveryAction::ChooseOtherModel => "recovery.choose_other_model",
            RecoveryAction::TopUpCredits => "recovery.top_up_credits",
            RecoveryAction::Retry => "recovery.retry",
        };
        rust_i18n::t!(key).to_string()
    }
}

/// A failure mapped onto the pipeline taxonomy.
///
/// Created fresh per failure and never mutated; severity, retryability and
/// presentation copy all derive from [`ErrorKind`].
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Internal message (English), kept for logs and diagnostics.
    pub message: String,
    /// HTTP status when the failure came from a response.
    pub status: Option<u16>,
    /// Free-form diagnostic key/value pairs supplied by the failure site.
    pub context: Vec<(String, String)>,
    pub timestamp: DateTime<Utc>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            context: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_context(mut self, context: Vec<(String, String)>) -> Self {
        self.context = context;
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn user_message(&self) -> String {
        self.kind.user_message()
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.kind.suggestions()
    }

    /// Actions a caller can offer the user, primary first.
    pub fn recovery_actions(&self) -> Vec<RecoveryAction> {
        let mut actions = Vec::new();
        match self.kind {
            ErrorKind::ApiKeyMissing | ErrorKind::ApiKeyInvalid => {
                actions.push(RecoveryAction::OpenSettings);
            }
            ErrorKind::ModelUnavailable => {
                actions.push(RecoveryAction::ChooseOtherModel);
            }
            ErrorKind::InsufficientCredits => {
                actions.push(RecoveryAction::TopUpCredits);
            }
            _ => {}
        }
        if self.retryable() {
            actions.push(RecoveryAction::Retry);
        }
        actions
    }

    /// Emits a structured log line at the level implied by severity.
    pub fn log(&self) {
        match self.severity() {
            Severity::Low => tracing::info!(
                kind = self.kind.as_str(),
                status = self.status,
                context = ?self.context,
                "{}",
                self.message
            ),
            Severity::Medium => tracing::warn!(
                kind = self.kind.as_str(),
                status = self.status,
                context = ?self.context,
                "{}",
                self.message
            ),
            Severity::High | Severity::Critical => tracing::error!(
                kind = self.kind.as_str(),
                severity = self.severity().as_str(),
                status = self.status,
                context = ?self.context,
                "{}",
                self.message
            ),
        }
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Maps any pipeline failure onto the error taxonomy.
///
/// Precedence: transport-level predicates first, then HTTP status, then
/// message keywords, finally [`ErrorKind::Unknown`]. Already-classified
/// errors pass through unchanged apart from added context.
pub fn classify_error(error: &FitError, context: Vec<(String, String)>) -> ClassifiedError {
    let classified = match error {
        FitError::Ai(inner) => {
            let mut c = (**inner).clone();
            c.context.extend(context);
            return c;
        }
        FitError::MissingApiKey => ClassifiedError::new(ErrorKind::ApiKeyMissing, error.to_string()),
        FitError::Network(e) => {
            if e.is_timeout() {
                ClassifiedError::new(ErrorKind::Timeout, error.to_string())
            } else {
                ClassifiedError::new(ErrorKind::Network, error.to_string())
            }
        }
        FitError::Api { status, .. } => {
            let kind = ErrorKind::from_status(*status)
                .or_else(|| ErrorKind::from_message(&error.to_string()))
                .unwrap_or(ErrorKind::Unknown);
            ClassifiedError::new(kind, error.to_string()).with_status(*status)
        }
        FitError::Parse { .. } | FitError::Serde(_) => {
            ClassifiedError::new(ErrorKind::Parsing, error.to_string())
        }
        FitError::Validation(_) => ClassifiedError::new(ErrorKind::Validation, error.to_string()),
        other => {
            let kind = ErrorKind::from_message(&other.to_string()).unwrap_or(ErrorKind::Unknown);
            ClassifiedError::new(kind, other.to_string())
        }
    };
    classified.with_context(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    // === 状态码映射 ===

    #[test]
    fn test_classify_status_401_is_api_key_invalid() {
        let err = FitError::Api {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::ApiKeyInvalid);
        assert_eq!(classified.status, Some(401));
        assert!(!classified.retryable());
        assert_eq!(classified.severity(), Severity::High);
    }

    #[test]
    fn test_classify_status_403_is_insufficient_credits() {
        let err = FitError::Api {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.classify().kind, ErrorKind::InsufficientCredits);
    }

    #[test]
    fn test_classify_status_404_is_model_unavailable() {
        let err = FitError::Api {
            status: 404,
            message: "Not found".to_string(),
        };
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::ModelUnavailable);
        assert!(classified.retryable());
    }

    #[test]
    fn test_classify_status_422_is_validation() {
        let err = FitError::Api {
            status: 422,
            message: "Unprocessable".to_string(),
        };
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::Validation);
        assert!(!classified.retryable());
    }

    #[test]
    fn test_classify_status_429_is_rate_limit() {
        let err = FitError::Api {
            status: 429,
            message: "Too many requests".to_string(),
        };
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::RateLimit);
        assert!(classified.retryable());
        assert_eq!(classified.severity(), Severity::Medium);
    }

    #[test]
    fn test_classify_server_statuses() {
        for status in [500u16, 502, 503, 504] {
            let err = FitError::Api {
                status,
                message: "boom".to_string(),
            };
            assert_eq!(err.classify().kind, ErrorKind::Server, "status {}", status);
        }
    }

    #[test]
    fn test_classify_unmapped_status_falls_through_to_message() {
        let err = FitError::Api {
            status: 418,
            message: "rate limit reached for model".to_string(),
        };
        assert_eq!(err.classify().kind, ErrorKind::RateLimit);
    }

    #[test]
    fn test_classify_unmapped_status_without_keywords_is_unknown() {
        let err = FitError::Api {
            status: 418,
            message: "I'm a teapot".to_string(),
        };
        assert_eq!(err.classify().kind, ErrorKind::Unknown);
    }

    // === 消息关键字映射 ===

    #[test]
    fn test_classify_message_api_key() {
        let err = FitError::Other("backend rejected the api key".to_string());
        assert_eq!(err.classify().kind, ErrorKind::ApiKeyInvalid);
    }

    #[test]
    fn test_classify_message_unauthorized() {
        let err = FitError::Other("Unauthorized access".to_string());
        assert_eq!(err.classify().kind, ErrorKind::ApiKeyInvalid);
    }

    #[test]
    fn test_classify_message_rate_limit() {
        let err = FitError::Other("too many requests, slow down".to_string());
        assert_eq!(err.classify().kind, ErrorKind::RateLimit);
    }

    #[test]
    fn test_classify_message_credits() {
        let err = FitError::Other("insufficient funds on account".to_string());
        assert_eq!(err.classify().kind, ErrorKind::InsufficientCredits);
    }

    #[test]
    fn test_classify_message_timed_out() {
        let err = FitError::Other("operation timed out".to_string());
        assert_eq!(err.classify().kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_classify_message_json() {
        let err = FitError::Other("unexpected json token".to_string());
        assert_eq!(err.classify().kind, ErrorKind::Parsing);
    }

    #[test]
    fn test_classify_message_without_keywords_is_unknown() {
        let err = FitError::Other("something odd happened".to_string());
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::Unknown);
        assert!(classified.retryable());
    }

    // === 类型化变体 ===

    #[test]
    fn test_classify_missing_api_key_is_critical() {
        let classified = FitError::MissingApiKey.classify();
        assert_eq!(classified.kind, ErrorKind::ApiKeyMissing);
        assert_eq!(classified.severity(), Severity::Critical);
        assert!(!classified.retryable());
    }

    #[test]
    fn test_classify_parse_error_is_parsing() {
        let err = FitError::Parse {
            message: "bad response".to_string(),
            position: Some(42),
            excerpt: "{\"workout\"".to_string(),
        };
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::Parsing);
        assert!(classified.retryable());
    }

    #[test]
    fn test_classify_validation_error() {
        let err = FitError::Validation("duration must be positive".to_string());
        let classified = err.classify();
        assert_eq!(classified.kind, ErrorKind::Validation);
        assert!(!classified.retryable());
    }

    #[test]
    fn test_classify_already_classified_passes_through() {
        let original = ClassifiedError::new(ErrorKind::RateLimit, "slow down").with_status(429);
        let err: FitError = original.clone().into();
        let reclassified = classify_error(&err, vec![("attempt".to_string(), "2".to_string())]);
        assert_eq!(reclassified.kind, ErrorKind::RateLimit);
        assert_eq!(reclassified.status, Some(429));
        assert_eq!(reclassified.context.len(), 1);
    }

    #[test]
    fn test_classify_attaches_context() {
        let err = FitError::Other("boom".to_string());
        let classified = classify_error(
            &err,
            vec![("endpoint".to_string(), "/chat/completions".to_string())],
        );
        assert_eq!(classified.context[0].1, "/chat/completions");
    }

    // === 严重度与重试属性 ===

    #[test]
    fn test_kind_severity_table() {
        assert_eq!(ErrorKind::ApiKeyMissing.severity(), Severity::Critical);
        assert_eq!(ErrorKind::ApiKeyInvalid.severity(), Severity::High);
        assert_eq!(ErrorKind::InsufficientCredits.severity(), Severity::High);
        assert_eq!(ErrorKind::Server.severity(), Severity::High);
        assert_eq!(ErrorKind::Network.severity(), Severity::Medium);
        assert_eq!(ErrorKind::Unknown.severity(), Severity::Medium);
    }

    #[test]
    fn test_kind_retryable_table() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::RateLimit.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::Server.is_retryable());
        assert!(ErrorKind::Parsing.is_retryable());
        assert!(ErrorKind::ModelUnavailable.is_retryable());
        assert!(ErrorKind::Unknown.is_retryable());
        assert!(!ErrorKind::ApiKeyInvalid.is_retryable());
        assert!(!ErrorKind::ApiKeyMissing.is_retryable());
        assert!(!ErrorKind::InsufficientCredits.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical.level() > Severity::High.level());
        assert!(Severity::High.level() > Severity::Medium.level());
        assert!(Severity::Medium.level() > Severity::Low.level());
    }

    // === 用户文案 ===

    #[test]
    #[serial]
    fn test_user_message_resolves_from_locale() {
        rust_i18n::set_locale("en");
        let msg = ErrorKind::ApiKeyMissing.user_message();
        assert_eq!(msg, "No API key configured.");
    }

    #[test]
    #[serial]
    fn test_suggestions_counts() {
        rust_i18n::set_locale("en");
        assert_eq!(ErrorKind::ApiKeyMissing.suggestions().len(), 2);
        assert_eq!(ErrorKind::Network.suggestions().len(), 3);
        assert_eq!(ErrorKind::RateLimit.suggestions().len(), 3);
    }

    #[test]
    fn test_recovery_actions_primary_first() {
        let key_err = ClassifiedError::new(ErrorKind::ApiKeyMissing, "no key");
        assert_eq!(key_err.recovery_actions(), vec![RecoveryAction::OpenSettings]);

        let model_err = ClassifiedError::new(ErrorKind::ModelUnavailable, "gone");
        assert_eq!(
            model_err.recovery_actions(),
            vec![RecoveryAction::ChooseOtherModel, RecoveryAction::Retry]
        );

        let credits_err = ClassifiedError::new(ErrorKind::InsufficientCredits, "empty");
        assert_eq!(
            credits_err.recovery_actions(),
            vec![RecoveryAction::TopUpCredits]
        );

        let network_err = ClassifiedError::new(ErrorKind::Network, "offline");
        assert_eq!(network_err.recovery_actions(), vec![RecoveryAction::Retry]);
    }

    // === Display ===

    #[test]
    fn test_classified_error_display() {
        let classified = ClassifiedError::new(ErrorKind::RateLimit, "slow down");
        assert_eq!(format!("{}", classified), "RATE_LIMIT: slow down");
    }

    #[test]
    fn test_fit_error_wraps_classified() {
        let err: FitError = ClassifiedError::new(ErrorKind::Server, "exploded").into();
        assert!(matches!(err, FitError::Ai(_)));
        assert_eq!(format!("{}", err), "SERVER_ERROR: exploded");
    }
}
