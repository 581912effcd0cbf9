use std::{env, fmt, fs, path::Path, str::FromStr, time::Duration};

use crate::{completion::retry::RetryPolicy, errors::Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and professional AI assistant. \
Provide clear, concise, and accurate responses.";

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Typed configuration, built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: Secret,
    pub api_key: Secret,

    // Completion API
    pub base_url: String,
    pub model_name: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,

    // Relay policy
    pub request_timeout: Duration,
    pub max_input_chars: usize,
    pub retry: RetryPolicy,

    // Telegram limits
    pub telegram_message_limit: usize,
}

impl Config {
    /// Load from the process environment, reading `./.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Missing credentials and unparsable values are reported with the name of
    /// the offending variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let api_key = get("DEEPSEEK_API_KEY").ok_or_else(|| {
            Error::Config("DEEPSEEK_API_KEY environment variable is required".to_string())
        })?;

        let base_url = get("DEEPSEEK_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "DEEPSEEK_BASE_URL must start with http:// or https:// (got {base_url:?})"
            )));
        }

        let model_name = get("DEEPSEEK_MODEL")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let system_prompt =
            get("SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let temperature = parse_var(&get, "TEMPERATURE")?.unwrap_or(0.7_f32);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(Error::Config(format!(
                "TEMPERATURE must be a number between 0 and 2 (got {temperature})"
            )));
        }
        let max_tokens = parse_var(&get, "MAX_TOKENS")?.unwrap_or(2000_u32);

        let timeout_secs = parse_var(&get, "RELAY_TIMEOUT_SECS")?.unwrap_or(30_u64);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "RELAY_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        let max_input_chars = parse_var(&get, "MAX_INPUT_CHARS")?.unwrap_or(4096_usize);
        if max_input_chars == 0 {
            return Err(Error::Config(
                "MAX_INPUT_CHARS must be greater than zero".to_string(),
            ));
        }

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_rate_limit_retries: parse_var(&get, "RELAY_MAX_RATE_LIMIT_RETRIES")?
                .unwrap_or(defaults.max_rate_limit_retries),
            max_server_error_retries: parse_var(&get, "RELAY_MAX_SERVER_ERROR_RETRIES")?
                .unwrap_or(defaults.max_server_error_retries),
            max_unavailable_retries: parse_var(&get, "RELAY_MAX_UNAVAILABLE_RETRIES")?
                .unwrap_or(defaults.max_unavailable_retries),
            base_delay: parse_var(&get, "RELAY_BACKOFF_BASE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: parse_var(&get, "RELAY_BACKOFF_MAX_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            factor: defaults.factor,
        };
        if retry.max_delay < retry.base_delay {
            return Err(Error::Config(format!(
                "RELAY_BACKOFF_MAX_MS ({}) must not be below RELAY_BACKOFF_BASE_MS ({})",
                retry.max_delay.as_millis(),
                retry.base_delay.as_millis()
            )));
        }

        // Telegram hard limit is 4096 characters per message.
        let telegram_message_limit = parse_var(&get, "TELEGRAM_MESSAGE_LIMIT")?
            .unwrap_or(4096_usize)
            .clamp(1, 4096);

        Ok(Self {
            telegram_bot_token: Secret::new(telegram_bot_token),
            api_key: Secret::new(api_key),
            base_url,
            model_name,
            system_prompt,
            temperature,
            max_tokens,
            request_timeout: Duration::from_secs(timeout_secs),
            max_input_chars,
            retry,
            telegram_message_limit,
        })
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key} has an invalid value {raw:?}: {e}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
