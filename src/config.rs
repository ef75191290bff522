//! Nimbus Configuration
//!
//! Loads the application configuration from the process environment.
//! A `.env` file, if present, is merged into the environment by the
//! entry point before this module runs.

use std::env;

use crate::types::AppConfig;

/// Default chat-completions endpoint (Groq, OpenAI-compatible).
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Default max tokens per completion.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Default bind address for the web UI.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Load the configuration from environment variables, filling unset or
/// unparsable values with defaults.
///
/// No validation is performed here: an absent `GROQ_API_KEY` is carried
/// through as an empty string and only surfaces when the first model
/// call is attempted.
pub fn load_config() -> AppConfig {
    let api_base = env::var("NIMBUS_API_BASE")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let api_key = env::var("GROQ_API_KEY").unwrap_or_default();
    let model = env::var("NIMBUS_MODEL")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let max_tokens = env::var("NIMBUS_MAX_TOKENS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_TOKENS);
    let temperature = env::var("NIMBUS_TEMPERATURE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(DEFAULT_TEMPERATURE);
    let host = env::var("NIMBUS_HOST")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = env::var("NIMBUS_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    AppConfig {
        api_base,
        api_key,
        model,
        max_tokens,
        temperature,
        host,
        port,
    }
}
