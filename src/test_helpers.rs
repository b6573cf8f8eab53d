use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::Mutex;

use crate::auth::{Claims, JWTKeys};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{Account, NewGeneration, Tags};
use crate::openai::{ContentGenerator, GenerationPrompt, GeneratorError};
use crate::store::{Store, ToolId};
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Noon UTC on January `n`, 2024.
pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn free_account(store: &Store, subject: &str) -> Result<Account, AppError> {
    Account::get_or_create(store, subject, day(1))
}

pub fn premium_account(store: &Store, subject: &str) -> Result<Account, AppError> {
    let account = Account::get_or_create(store, subject, day(1))?;
    Account::upgrade(store, account.id)
}

pub fn new_generation(tool_id: ToolId) -> NewGeneration {
    NewGeneration {
        tool_id,
        prompt: "Write about sourdough".to_string(),
        output: "Sourdough is a slow craft.".to_string(),
        title: "Sourdough".to_string(),
        tags: Tags::parse("baking"),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        openai_api_key: "sk-test".to_string(),
        openai_api_base: None,
        openai_model: "gpt-4o".to_string(),
        openai_max_tokens: 2000,
        openai_temperature: 0.7,
        generation_timeout: Duration::from_millis(500),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        free_daily_limit: 3,
        quota_utc_offset: chrono::Offset::fix(&Utc),
    }
}

/// Shared state over a fresh store plus the keys its middleware verifies against.
pub fn test_app(generator: impl ContentGenerator + 'static) -> (Arc<AppState>, JWTKeys) {
    let config = test_config();
    let state = AppState::new(
        &config,
        Arc::new(Store::new()),
        Arc::new(generator),
        Arc::new(SystemClock),
    );
    (Arc::new(state), JWTKeys::new(config.jwt_secret.as_bytes()))
}

/// Mint an HS256 token for `subject` valid for one hour, the way the identity provider does.
pub fn sign_jwt(subject: &str, secret: &[u8]) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: subject.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// `Authorization` header value for `subject`, signed with the test secret.
pub fn bearer(subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
    Ok(format!("Bearer {}", sign_jwt(subject, TEST_JWT_SECRET.as_bytes())?))
}

/// Clock pinned to an instant the test moves by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Generator that succeeds after a fixed delay and counts its calls.
pub struct SlowGenerator {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        SlowGenerator {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ContentGenerator for SlowGenerator {
    async fn generate(&self, request: &GenerationPrompt) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(format!("{}: {}", request.kind, request.prompt))
    }
}
