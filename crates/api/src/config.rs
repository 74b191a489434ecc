//! Process configuration, read once from the environment at startup.

use anyhow::Context;

use tallybank_core::Currency;
use tallybank_ledger::transfers::DEFAULT_MAX_ATTEMPTS;
use tallybank_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEV_API_KEY: &str = "dev-api-key";

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub api_key: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub currency: Currency,
    pub transfer_max_attempts: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            api_key: DEV_API_KEY.to_string(),
            database_url: None,
            currency: Currency::default(),
            transfer_max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| defaults.jwt_secret.clone());
        let api_key = std::env::var("API_KEY").unwrap_or_else(|_| defaults.api_key.clone());

        let currency = match std::env::var("CURRENCY") {
            Ok(code) => Currency::new(&code).context("invalid CURRENCY")?,
            Err(_) => defaults.currency.clone(),
        };

        let transfer_max_attempts = match std::env::var("TRANSFER_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("TRANSFER_MAX_ATTEMPTS must be a positive integer, got '{raw}'"))?,
            Err(_) => defaults.transfer_max_attempts,
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret,
            api_key,
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            currency,
            transfer_max_attempts,
            log_format: LogFormat::from_env(),
        })
    }

    /// Names of credentials still set to their insecure development values.
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.jwt_secret == DEV_JWT_SECRET {
            names.push("JWT_SECRET");
        }
        if self.api_key == DEV_API_KEY {
            names.push("API_KEY");
        }
        names
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"***")
            .field("api_key", &"***")
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .field("currency", &self.currency)
            .field("transfer_max_attempts", &self.transfer_max_attempts)
            .field("log_format", &self.log_format)
            .finish()
    }
}
