//! Runtime configuration read from the environment (and `.env`).

use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::net::SocketAddr;

use crate::marketplace::AdminSettings;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    LongPolling,
    /// Telegram posts updates to `url`; the listener binds `address`
    Webhook { url: Url, address: SocketAddr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub admin: AdminSettings,
    pub transport: Transport,
    pub log_format: LogFormat,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let admin_id = get("ADMIN_USER_ID")
            .map(|raw| {
                raw.parse::<i64>()
                    .with_context(|| format!("ADMIN_USER_ID must be a numeric Telegram id: {raw}"))
            })
            .transpose()?;
        let admin_handle = get("ADMIN_USERNAME").map(|h| h.trim_start_matches('@').to_string());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let transport = match get("WEBHOOK_URL") {
            Some(raw) => {
                let base = Url::parse(&raw).with_context(|| format!("WEBHOOK_URL is not a valid URL: {raw}"))?;
                let url = webhook_endpoint(&base)?;
                Transport::Webhook {
                    url,
                    address: SocketAddr::from(([0, 0, 0, 0], port)),
                }
            }
            None => Transport::LongPolling,
        };

        let log_format = match get("LOG_FORMAT").map(|f| f.to_ascii_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be `json` or `pretty`, got `{other}`"),
        };

        Ok(Self {
            bot_token,
            database_url: get("DATABASE_URL"),
            max_connections,
            admin: AdminSettings {
                admin_id,
                admin_handle,
            },
            transport,
            log_format,
        })
    }
}

/// `https://host/base` -> `https://host/base/webhook`
fn webhook_endpoint(base: &Url) -> Result<Url> {
    if base.cannot_be_a_base() {
        bail!("WEBHOOK_URL cannot be used as a base URL: {base}");
    }
    let path = format!("{}/webhook", base.path().trim_end_matches('/'));
    let mut url = base.clone();
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<BotConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.admin.admin_id, None);
        assert_eq!(config.transport, Transport::LongPolling);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_token_fails() {
        assert!(config(&[]).is_err());
        assert!(config(&[("TELEGRAM_BOT_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_admin_settings() {
        let config = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ADMIN_USER_ID", "42"),
            ("ADMIN_USERNAME", "@Boss"),
        ])
        .unwrap();
        assert_eq!(config.admin.admin_id, Some(42));
        assert_eq!(config.admin.admin_handle.as_deref(), Some("Boss"));

        assert!(BotConfig::from_lookup(|k| match k {
            "TELEGRAM_BOT_TOKEN" => Some("t".into()),
            "ADMIN_USER_ID" => Some("boss".into()),
            _ => None,
        })
        .is_err());
    }

    #[test]
    fn test_webhook_transport() {
        let config = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("WEBHOOK_URL", "https://bot.example.com/hooks/"),
            ("PORT", "9000"),
        ])
        .unwrap();
        match config.transport {
            Transport::Webhook { url, address } => {
                assert_eq!(url.as_str(), "https://bot.example.com/hooks/webhook");
                assert_eq!(address.port(), 9000);
            }
            other => panic!("expected webhook transport, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config(&[("TELEGRAM_BOT_TOKEN", "t"), ("PORT", "http")]).is_err());
        assert!(config(&[("TELEGRAM_BOT_TOKEN", "t"), ("WEBHOOK_URL", "not a url")]).is_err());
        assert!(config(&[("TELEGRAM_BOT_TOKEN", "t"), ("LOG_FORMAT", "xml")]).is_err());
        assert_eq!(
            config(&[("TELEGRAM_BOT_TOKEN", "t"), ("LOG_FORMAT", "JSON")])
                .unwrap()
                .log_format,
            LogFormat::Json
        );
    }
}
