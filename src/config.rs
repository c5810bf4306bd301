//! Environment-variable configuration surface.

use std::path::PathBuf;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Absent means the provider is unconfigured and startup backfill skips.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub generation_hour: u32,
    pub generation_minute: u32,
    pub enable_manual_generation: bool,
    pub app_host: String,
    pub app_port: u16,
    pub database_path: PathBuf,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty() && k != "your_openai_api_key_here");

        Self {
            api_key,
            base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_or("OPENAI_MODEL", "gpt-3.5-turbo"),
            max_retries: env_or("QUOTE_MAX_RETRIES", "3").parse().unwrap_or(3).max(1),
            generation_hour: env_or("QUOTE_GENERATION_HOUR", "23")
                .parse()
                .ok()
                .filter(|h| *h < 24)
                .unwrap_or(23),
            generation_minute: env_or("QUOTE_GENERATION_MINUTE", "0")
                .parse()
                .ok()
                .filter(|m| *m < 60)
                .unwrap_or(0),
            enable_manual_generation: env_bool("ENABLE_MANUAL_GENERATION"),
            app_host: env_or("APP_HOST", "0.0.0.0"),
            app_port: env_or("APP_PORT", "8000").parse().unwrap_or(8000),
            database_path: PathBuf::from(env_or("DATABASE_PATH", "daily_quotes.db")),
            debug: env_bool("DEBUG"),
        }
    }
}
