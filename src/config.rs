use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub anthropic_max_tokens: i32,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub gemini_safety_settings: String,
    pub prompt_timeout_seconds: u64,
    pub image_timeout_seconds: u64,
    pub assets_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub default_location: String,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            anthropic_api_key: env_string("ANTHROPIC_API_KEY", ""),
            anthropic_base_url: env_string("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            anthropic_model: env_string("ANTHROPIC_MODEL", "claude-sonnet-4-20250514"),
            anthropic_max_tokens: env_i32("ANTHROPIC_MAX_TOKENS", 1024),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_base_url: env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-3-pro-image-preview"),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "permissive",
            )),
            prompt_timeout_seconds: env_u64("PROMPT_TIMEOUT_SECONDS", 60),
            image_timeout_seconds: env_u64("IMAGE_TIMEOUT_SECONDS", 120),
            assets_dir: PathBuf::from(env_string("ASSETS_DIR", "assets")),
            outputs_dir: PathBuf::from(env_string("OUTPUTS_DIR", "outputs")),
            default_location: env_string("DEFAULT_LOCATION", "cyclez"),
        })
    }
}
