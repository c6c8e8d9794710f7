//! Runtime configuration
//!
//! Loaded once at startup from the process environment (after `.env`).

use std::time::Duration;

use crate::classifier::ClassifierKind;
use crate::error::GatewayError;
use crate::Result;

/// Model used for every generation call
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub request_timeout: Duration,
    pub bind_host: String,
    pub port: u16,
    pub classifier: ClassifierKind,
    pub portfolio_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or_else(|| {
            GatewayError::Config("GEMINI_API_KEY is not set".to_string())
        })?;

        let gemini_base_url = get("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                GatewayError::Config(format!("GEMINI_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                GatewayError::Config(format!("PORT must be a valid port, got '{}'", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let classifier = match get("QUERY_CLASSIFIER") {
            Some(raw) => raw.parse()?,
            None => ClassifierKind::default(),
        };

        let portfolio_fallback = match get("PORTFOLIO_FALLBACK") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                GatewayError::Config(format!("PORTFOLIO_FALLBACK must be true or false, got '{}'", raw))
            })?,
            None => true,
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            bind_host: get("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            port,
            classifier,
            portfolio_fallback,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
