//! # fittrack-rs
//!
//! AI 驱动的训练课表生成引擎，通过 OpenRouter 调用大语言模型。
//!
//! ## 功能
//! - **训练生成**：基于用户画像和会话参数生成结构化课表（热身 / 训练块 / 放松）
//! - **安全分析**：本地规则识别疼痛、年龄、新手高强度等风险，结论覆盖模型自报的版本
//! - **模型目录**：按场景（fast / precise / creative / custom）选择 OpenRouter 模型
//! - **容错解析**：三阶段解析，应对 markdown 围栏、前后缀噪声和截断的 JSON
//! - **错误分类与重试**：失败按类别归类、按类别退避重试，并附带用户可读的建议
//! - **国际化**：支持英文和德文
//!
//! ## 快速开始
//! ```ignore
//! use std::sync::Arc;
//!
//! use fittrack_rs::config::load_config;
//! use fittrack_rs::llm::{OpenRouterClient, WorkoutGenerator};
//! use fittrack_rs::profile::UserProfile;
//!
//! # async fn example() -> anyhow::Result<()> {
//! fittrack_rs::init_tls();
//!
//! // 1. 加载配置并初始化语言
//! let config = load_config()?;
//! fittrack_rs::init_locale(config.app.language.as_deref());
//!
//! // 2. 构建 OpenRouter 客户端和生成器
//! let api_key = std::env::var("OPENROUTER_API_KEY")?;
//! let provider = Arc::new(OpenRouterClient::new(api_key, &config)?);
//! let generator = WorkoutGenerator::new(provider, config);
//!
//! // 3. 从用户画像生成一节训练
//! let profile: UserProfile = serde_json::from_str(
//!     r#"{
//!         "name": "Alex", "age": 31,
//!         "fitnessGoal": "muscle_gain", "fitnessLevel": "intermediate",
//!         "workoutFrequency": "3-4", "availableEquipment": "basic",
//!         "workoutDuration": 45, "workoutMode": "guided", "humorLevel": "light"
//!     }"#,
//! )?;
//! let response = generator.generate_quick(&profile, Some("upper body")).await?;
//! println!("{} ({} blocks)", response.workout.title, response.workout.blocks.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## 核心模块
//! - [`llm`] - 生成管线：提示词、模型目录、OpenRouter 传输、响应解析
//! - [`safety`] - 基于规则的本地安全分析
//! - [`profile`] - 用户画像数据模型
//! - [`workout`] - 课表与会话参数数据模型
//! - [`config`] - 配置管理
//! - [`store`] - 设置与 API key 存储
//! - [`error`] - 统一错误类型与错误分类
//!
//! ## 配置
//! 配置文件位置：
//! - Linux: `~/.config/fittrack/config.toml`
//! - macOS: `~/Library/Application Support/fittrack/config.toml`
//! - Windows: `%APPDATA%\fittrack\config\config.toml`
//!
//! 示例配置：
//! ```toml
//! [app]
//! language = "de"
//!
//! [network]
//! request_timeout = 60
//! max_attempts = 3
//!
//! [generation]
//! temperature = 0.7
//! workout_max_tokens = 3000
//! ```

#[macro_use]
extern crate rust_i18n;

pub mod config;
pub mod constants;
pub mod error;
pub mod llm;
pub mod profile;
pub mod safety;
pub mod store;
pub mod workout;

pub use error::{FitError, Result};

// Initialize i18n for library modules
i18n!("locales", fallback = "en");

/// 初始化 UI 语言。
///
/// 优先级：显式 preference（通常来自配置的 `app.language`）→
/// `FITTRACK_LANG` 环境变量 → 系统 locale → `en`。
pub fn init_locale(preference: Option<&str>) {
    let locale = preference
        .map(|value| value.to_string())
        .or_else(|| std::env::var("FITTRACK_LANG").ok())
        .or_else(detect_system_locale)
        .unwrap_or_else(|| "en".to_string());
    rust_i18n::set_locale(&locale);
}

/// 读取系统 locale 并归一化为 BCP 47 形式（"de_DE" → "de-DE"）
fn detect_system_locale() -> Option<String> {
    sys_locale::get_locale().map(|locale| locale.replace('_', "-"))
}

/// 安装 rustls 的 ring CryptoProvider。
///
/// reqwest 以 rustls-no-provider 特性构建，发起 HTTPS 请求前进程内
/// 必须装有一个 provider。多次调用是安全的（install_default 失败时
/// 忽略即可）。
pub fn init_tls() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    // SAFETY: 测试环境中修改环境变量是安全的，且使用 serial_test 确保串行执行

    #[test]
    #[serial]
    fn test_init_locale_explicit_preference_wins() {
        unsafe { std::env::set_var("FITTRACK_LANG", "de") };
        super::init_locale(Some("en"));
        assert_eq!(&*rust_i18n::locale(), "en");
        unsafe { std::env::remove_var("FITTRACK_LANG") };
    }

    #[test]
    #[serial]
    fn test_init_locale_env_fallback() {
        unsafe { std::env::set_var("FITTRACK_LANG", "de") };
        super::init_locale(None);
        assert_eq!(&*rust_i18n::locale(), "de");
        unsafe { std::env::remove_var("FITTRACK_LANG") };
        super::init_locale(Some("en"));
    }

    #[test]
    fn test_init_tls_is_idempotent() {
        super::init_tls();
        super::init_tls();
    }
}
