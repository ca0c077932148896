// 配置加载逻辑
//
// 此文件负责从文件和环境变量加载配置。

use config::{Config, Environment, File};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use super::structs::AppConfig;
use crate::error::Result;

/// 加载应用配置
///
/// 配置加载优先级（从高到低）：
/// 1. 环境变量（FITTRACK__* 前缀，双下划线表示嵌套）
///    - 例如：`FITTRACK__NETWORK__MAX_ATTEMPTS=5`
///    - 例如：`FITTRACK__APP__LANGUAGE=de`
/// 2. 配置文件（~/.config/fittrack/config.toml）
/// 3. 默认值（来自 structs 的 Default trait 和 serde(default) 属性）
pub fn load_config() -> Result<AppConfig> {
    load_config_from(get_config_path().as_deref())
}

/// 从指定路径加载配置（路径为 None 或文件不存在时仅用环境变量与默认值）
pub fn load_config_from(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    // 1. 加载配置文件（如果存在）
    if let Some(path) = config_path
        && path.exists()
    {
        builder = builder.add_source(File::from(path.to_path_buf()));
    }

    // 2. 加载环境变量（FITTRACK__*，优先级最高）
    // 使用双下划线作为嵌套层级分隔符，避免与字段名中的单下划线冲突
    // 例如：FITTRACK__NETWORK__REQUEST_TIMEOUT -> network.request_timeout
    builder = builder.add_source(
        Environment::with_prefix("FITTRACK")
            .separator("__")
            .try_parsing(true),
    );

    // 构建并反序列化配置
    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate()?;

    Ok(app_config)
}

/// 获取配置文件路径
///
/// 返回 ~/.config/fittrack/config.toml
fn get_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fittrack").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// 获取配置目录路径
///
/// 设置存储（settings.json）也放在这个目录下
pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fittrack").map(|dirs| dirs.config_dir().to_path_buf())
}
