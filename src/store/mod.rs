//! Settings persistence.
//!
//! The OpenRouter API key is user data, not configuration, so it lives in
//! a small key/value store instead of the config file. [`JsonFileStore`]
//! is the production backend; [`MemoryStore`] backs tests and embedders
//! that manage persistence themselves.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::constants::store::{API_KEY_MIN_LENGTH, API_KEY_NAME, API_KEY_PREFIX, PLACEHOLDER_KEYS};
use crate::error::{FitError, Result};

/// String key/value persistence seam.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Looks up the stored API key, falling back to the `OPENROUTER_API_KEY`
/// environment variable.
pub fn stored_api_key(store: &dyn SettingsStore) -> Result<Option<String>> {
    if let Some(key) = store.get(API_KEY_NAME)? {
        return Ok(Some(key));
    }
    Ok(std::env::var("OPENROUTER_API_KEY").ok())
}

/// Resolves a usable API key or fails fast.
///
/// Placeholder values left over from dotenv templates count as missing.
pub fn require_api_key(store: &dyn SettingsStore) -> Result<String> {
    match stored_api_key(store)? {
        Some(key) if !is_placeholder(&key) => Ok(key),
        _ => Err(FitError::MissingApiKey),
    }
}

/// Validates and persists a new API key.
pub fn set_api_key(store: &dyn SettingsStore, key: &str) -> Result<()> {
    validate_api_key_format(key)?;
    store.set(API_KEY_NAME, key)
}

/// Removes the stored API key.
pub fn clear_api_key(store: &dyn SettingsStore) -> Result<()> {
    store.remove(API_KEY_NAME)
}

/// Checks an API key against the OpenRouter key format.
pub fn validate_api_key_format(key: &str) -> Result<()> {
    if is_placeholder(key) {
        return Err(FitError::Store(
            rust_i18n::t!("store.key_placeholder").to_string(),
        ));
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(FitError::Store(
            rust_i18n::t!("store.key_invalid_prefix", prefix = API_KEY_PREFIX).to_string(),
        ));
    }
    if key.len() < API_KEY_MIN_LENGTH {
        return Err(FitError::Store(
            rust_i18n::t!("store.key_too_short", min = API_KEY_MIN_LENGTH).to_string(),
        ));
    }
    Ok(())
}

fn is_placeholder(key: &str) -> bool {
    let trimmed = key.trim();
    PLACEHOLDER_KEYS.contains(&trimmed)
}

/// Mask API key to prevent log leaks
///
/// # rule
/// - length > 14: display first 10 characters + `...` + last 4 characters
/// - length <= 14: display `****`
///
/// # Example
/// ```
/// use fittrack_rs::store::mask_api_key;
///
/// assert_eq!(
///     mask_api_key("sk-or-v1-0123456789abcdef"),
///     "sk-or-v1-0...cdef"
/// );
/// assert_eq!(mask_api_key("short"), "****");
/// ```
pub fn mask_api_key(key: &str) -> String {
    if key.len() > 14 {
        format!("{}...{}", &key[..10], &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}
