use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::FixedOffset;
use shuttle_runtime::SecretStore;

use crate::quota::QuotaPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,
    pub generation_timeout: Duration,
    pub jwt_secret: String,
    pub free_daily_limit: u32,
    pub quota_utc_offset: FixedOffset,
}

impl AppConfig {
    pub fn new(secret_store: &SecretStore) -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| secret_store.get(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .ok_or_else(|| anyhow!("OPENAI_API_KEY not found"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow!("JWT_SECRET not found"))?;

        let openai_api_base = lookup("OPENAI_API_BASE");

        let openai_model = lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string());

        let openai_max_tokens = parse_or(&lookup, "OPENAI_MAX_TOKENS", 2000)?;
        let openai_temperature = parse_or(&lookup, "OPENAI_TEMPERATURE", 0.7)?;
        let timeout_secs: u64 = parse_or(&lookup, "GENERATION_TIMEOUT_SECS", 60)?;
        let free_daily_limit = parse_or(&lookup, "FREE_DAILY_LIMIT", 3)?;

        let offset_minutes: i32 = parse_or(&lookup, "QUOTA_UTC_OFFSET_MINUTES", 0)?;
        let quota_utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("QUOTA_UTC_OFFSET_MINUTES out of range: {}", offset_minutes))?;

        Ok(AppConfig {
            openai_api_key,
            openai_api_base,
            openai_model,
            openai_max_tokens,
            openai_temperature,
            generation_timeout: Duration::from_secs(timeout_secs),
            jwt_secret,
            free_daily_limit,
            quota_utc_offset,
        })
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy::new(self.free_daily_limit, self.quota_utc_offset)
    }
}

// Optional numeric secrets fall back to a default when absent but fail loudly when malformed.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} is not a valid value: {:?}", key, raw)),
        None => Ok(default),
    }
}
