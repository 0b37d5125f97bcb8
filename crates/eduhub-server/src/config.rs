use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use eduhub_ai::AiConfig;
use eduhub_ai::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub const DEFAULT_MAP_URL_TEMPLATE: &str =
    "https://maps.google.com/maps?q={lat},{lng}&z=15&output=embed";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub ai: AiConfig,
    pub map_url_template: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("EDUHUB_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!(
                "EDUHUB_JWT_SECRET is unset or still a placeholder; \
                 set it in your .env file and restart"
            );
        }

        let port = match var("EDUHUB_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("EDUHUB_PORT '{}' is not a port", raw))?,
            None => 3000,
        };

        Ok(Self {
            host: var("EDUHUB_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("EDUHUB_DB_PATH").unwrap_or_else(|| "eduhub.db".into()).into(),
            jwt_secret,
            ai: AiConfig {
                base_url: var("EDUHUB_AI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
                api_key: var("EDUHUB_AI_API_KEY"),
                model: var("EDUHUB_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            },
            map_url_template: var("EDUHUB_MAP_URL_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_MAP_URL_TEMPLATE.into()),
        })
    }
}
