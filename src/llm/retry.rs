//! 重试策略与指数退避计算
//!
//! 按错误类别决定是否重试以及等待多久。429 的 Retry-After header 也在这里解析。

use std::time::{Duration, SystemTime};

use crate::constants::retry::{MAX_BACKOFF_MS, MIN_RETRY_DELAY_MS, RATE_LIMIT_MAX_ATTEMPTS};
use crate::error::ErrorKind;

/// 判断失败后是否应该再次尝试
///
/// `attempt` 是已完成的尝试次数（从 1 开始），`max_attempts` 是包含首次请求的总尝试数上限。
///
/// # 规则
/// - 尝试次数用尽 -> 不重试
/// - 错误类别不可重试（API key、credits、校验错误）-> 不重试
/// - 限流只额外重试一次，无论预算还剩多少
pub fn should_retry(kind: ErrorKind, attempt: u32, max_attempts: u32) -> bool {
    if attempt >= max_attempts {
        return false;
    }
    if !kind.is_retryable() {
        return false;
    }

    match kind {
        ErrorKind::RateLimit => attempt < RATE_LIMIT_MAX_ATTEMPTS,
        ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server => true,
        _ => kind.is_retryable(),
    }
}

/// 各错误类别的基础退避延迟（毫秒）
///
/// 不可重试的类别基础延迟为 0。
fn base_delay_ms(kind: ErrorKind) -> u64 {
    match kind {
        ErrorKind::RateLimit => 60_000,
        ErrorKind::Network => 2_000,
        ErrorKind::Timeout => 5_000,
        ErrorKind::Server => 10_000,
        ErrorKind::ApiKeyInvalid | ErrorKind::ApiKeyMissing => 0,
        ErrorKind::InsufficientCredits => 30_000,
        ErrorKind::ModelUnavailable => 15_000,
        ErrorKind::Validation => 0,
        ErrorKind::Parsing => 2_000,
        ErrorKind::Unknown => 5_000,
    }
}

/// 计算第 `attempt` 次失败后的等待时间
///
/// 指数退避（基础延迟 × 2^(attempt-1)）加上调用方提供的抖动，
/// 封顶 [`MAX_BACKOFF_MS`]。抖动由调用方生成，本函数保持纯函数便于测试。
///
/// # 参数
/// - `kind`: 触发重试的错误类别
/// - `attempt`: 已完成的尝试次数（从 1 开始）
/// - `jitter_ms`: 附加抖动（毫秒），调用方通常取 0..=1000 的随机值
pub fn retry_delay(kind: ErrorKind, attempt: u32, jitter_ms: u64) -> Duration {
    let base = base_delay_ms(kind);
    if base == 0 {
        return Duration::ZERO;
    }

    let multiplier = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    let delay_ms = base
        .saturating_mul(multiplier)
        .saturating_add(jitter_ms)
        .min(MAX_BACKOFF_MS)
        .max(MIN_RETRY_DELAY_MS);

    Duration::from_millis(delay_ms)
}

/// 解析 Retry-After header 值
///
/// 支持两种格式：
/// - 秒数：`120`
/// - HTTP 日期：`Wed, 21 Oct 2015 07:28:00 GMT`
///
/// 返回值：
/// - `Some(secs)`: 解析成功，返回等待秒数（日期早于当前时间时返回 0）
/// - `None`: 格式无效，无法解析
pub(crate) fn parse_retry_after(value: &str) -> Option<u64> {
    // 先尝试解析为秒数
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }

    // 再尝试解析为 HTTP 日期
    if let Ok(date) = httpdate::parse_http_date(value) {
        let now = SystemTime::now();
        // 如果日期早于当前时间，返回 0（立即重试）
        return Some(date.duration_since(now).map(|d| d.as_secs()).unwrap_or(0));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // === should_retry 测试 ===

    #[test]
    fn test_should_retry_exhausted_budget() {
        assert!(!should_retry(ErrorKind::Network, 3, 3));
        assert!(!should_retry(ErrorKind::Server, 5, 3));
    }

    #[test]
    fn test_should_retry_non_retryable_kinds() {
        for kind in [
            ErrorKind::ApiKeyInvalid,
            ErrorKind::ApiKeyMissing,
            ErrorKind::InsufficientCredits,
            ErrorKind::Validation,
        ] {
            assert!(!should_retry(kind, 1, 3), "{kind} should never retry");
        }
    }

    #[test]
    fn test_should_retry_rate_limit_only_once() {
        // 第一次失败后还可以重试一次
        assert!(should_retry(ErrorKind::RateLimit, 1, 3));
        // 之后即使预算充足也不再重试
        assert!(!should_retry(ErrorKind::RateLimit, 2, 5));
        assert!(!should_retry(ErrorKind::RateLimit, 3, 10));
    }

    #[test]
    fn test_should_retry_transient_kinds() {
        for kind in [ErrorKind::Network, ErrorKind::Timeout, ErrorKind::Server] {
            assert!(should_retry(kind, 1, 3), "{kind} should retry");
            assert!(should_retry(kind, 2, 3), "{kind} should retry");
        }
    }

    #[test]
    fn test_should_retry_default_retryable_kinds() {
        assert!(should_retry(ErrorKind::Parsing, 1, 3));
        assert!(should_retry(ErrorKind::ModelUnavailable, 2, 3));
        assert!(should_retry(ErrorKind::Unknown, 1, 3));
    }

    // === retry_delay 测试 ===

    #[test]
    fn test_retry_delay_exponential_growth() {
        assert_eq!(
            retry_delay(ErrorKind::Network, 1, 0),
            Duration::from_millis(2_000)
        );
        assert_eq!(
            retry_delay(ErrorKind::Network, 2, 0),
            Duration::from_millis(4_000)
        );
        assert_eq!(
            retry_delay(ErrorKind::Network, 3, 0),
            Duration::from_millis(8_000)
        );
    }

    #[test]
    fn test_retry_delay_adds_jitter() {
        assert_eq!(
            retry_delay(ErrorKind::Timeout, 1, 500),
            Duration::from_millis(5_500)
        );
    }

    #[test]
    fn test_retry_delay_capped_at_max() {
        // 60s 基础延迟在第二次尝试时翻倍，但封顶在 60s
        assert_eq!(
            retry_delay(ErrorKind::RateLimit, 2, 0),
            Duration::from_millis(MAX_BACKOFF_MS)
        );
        // 抖动也不能突破上限
        assert_eq!(
            retry_delay(ErrorKind::RateLimit, 1, 999),
            Duration::from_millis(MAX_BACKOFF_MS)
        );
    }

    #[test]
    fn test_retry_delay_zero_for_non_retryable_base() {
        assert_eq!(retry_delay(ErrorKind::ApiKeyInvalid, 1, 500), Duration::ZERO);
        assert_eq!(retry_delay(ErrorKind::ApiKeyMissing, 3, 0), Duration::ZERO);
        assert_eq!(retry_delay(ErrorKind::Validation, 1, 0), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_shift_overflow_saturates() {
        // 位移超过 63 位时饱和到 u64::MAX，最终仍被封顶
        assert_eq!(
            retry_delay(ErrorKind::Network, 70, 0),
            Duration::from_millis(MAX_BACKOFF_MS)
        );
    }

    // === parse_retry_after 测试 ===

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(120));
        assert_eq!(parse_retry_after("0"), Some(0));
    }

    #[test]
    fn test_parse_retry_after_past_http_date() {
        // 过去的日期意味着立即重试
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(0));
    }

    #[test]
    fn test_parse_retry_after_invalid() {
        assert_eq!(parse_retry_after("not-a-date"), None);
        assert_eq!(parse_retry_after(""), None);
        assert_eq!(parse_retry_after("-5"), None);
    }
}
