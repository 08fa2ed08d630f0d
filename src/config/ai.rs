// src/config/ai.rs
use std::env;
use std::fmt;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_ENDPOINT: &str = "GEMINI_ENDPOINT";
pub const ENV_TEMPERATURE: &str = "NEWS_AI_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "NEWS_AI_MAX_TOKENS";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// API credential. `None` is a supported mode: enrichment runs fully offline.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    None,
    ApiKey(String),
}

impl Credential {
    pub fn from_value(raw: Option<String>) -> Self {
        match raw.map(|s| s.trim().to_string()) {
            Some(k) if !k.is_empty() => Credential::ApiKey(k),
            _ => Credential::None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Credential::ApiKey(_))
    }
}

// Never print the key itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::None => f.write_str("Credential::None"),
            Credential::ApiKey(k) => write!(f, "Credential::ApiKey(len={})", k.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub credential: Credential,
    pub model: String,
    /// Base URL; the client appends `/models/{model}:generateContent`.
    pub endpoint: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            credential: Credential::None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Build from any key lookup; used by `from_env` and by tests.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let mut cfg = AiConfig {
            credential: Credential::from_value(get(ENV_API_KEY)),
            ..Default::default()
        };

        if let Some(m) = get(ENV_MODEL).filter(|s| !s.trim().is_empty()) {
            cfg.model = m.trim().to_string();
        }
        if let Some(e) = get(ENV_ENDPOINT).filter(|s| !s.trim().is_empty()) {
            cfg.endpoint = e.trim().trim_end_matches('/').to_string();
        }
        if let Some(t) = get(ENV_TEMPERATURE).and_then(|s| s.trim().parse::<f32>().ok()) {
            cfg.temperature = t.clamp(0.0, 1.0);
        }
        if let Some(n) = get(ENV_MAX_TOKENS).and_then(|s| s.trim().parse::<u32>().ok()) {
            if n > 0 {
                cfg.max_output_tokens = n;
            }
        }
        cfg
    }
}
