//! Single entry point tying quota enforcement, the content generator, and saved generations
//! together.
//!
//! ```text
//! RECEIVED -> QUOTA_CHECKED -> [REJECTED(quota)]
//!                           -> GENERATING -> [GENERATED] | [FAILED(generator_error)]
//! GENERATED ... SAVE_REQUESTED -> [SAVED] | [FAILED(not_premium)]
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::clock::Clock;
use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{auto_title, Account, GenerationRecord, NewGeneration, Tags, Tool};
use crate::openai::{ContentGenerator, GenerationPrompt};
use crate::quota::{QuotaPolicy, QuotaTracker};
use crate::store::{AccountId, GenerationId, Store, ToolId};

/// Caller-supplied fields for saving a generation; `title` is derived when blank.
#[derive(Debug, Clone, Default)]
pub struct SaveGeneration {
    pub tool_id: ToolId,
    pub prompt: String,
    pub output: String,
    pub title: Option<String>,
    pub tags: Tags,
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<Store>,
    quota: QuotaTracker,
    generator: Arc<dyn ContentGenerator>,
    clock: Arc<dyn Clock>,
    generation_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<Store>,
        policy: QuotaPolicy,
        generator: Arc<dyn ContentGenerator>,
        clock: Arc<dyn Clock>,
        generation_timeout: Duration,
    ) -> Self {
        Orchestrator {
            quota: QuotaTracker::new(store.clone(), policy),
            store,
            generator,
            clock,
            generation_timeout,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn policy(&self) -> &QuotaPolicy {
        self.quota.policy()
    }

    /// Resolve the caller's account, registering it on first use.
    pub fn account_for(&self, user: &AuthenticatedUser) -> Result<Account, AppError> {
        Account::get_or_create(&self.store, &user.user_id, self.now())
    }

    /// Generate text with `tool_id` for `account_id`.
    ///
    /// Quota is checked before anything else and only a successful generation consumes it.
    pub async fn generate(
        &self,
        account_id: AccountId,
        tool_id: ToolId,
        prompt: &str,
        tone: &str,
        length: &str,
    ) -> Result<String, AppError> {
        // Unknown account -> NotFound, no headroom -> QuotaExceeded; neither mutates state.
        let reservation = self.quota.reserve(account_id, self.now())?;

        // Dropping the reservation on this early return hands the slot back.
        let tool = Tool::get(&self.store, tool_id)?;

        let request = GenerationPrompt {
            kind: tool.kind(),
            prompt: prompt.to_string(),
            tone: tone.to_string(),
            length: length.to_string(),
        };

        let outcome = tokio::time::timeout(self.generation_timeout, self.generator.generate(&request))
            .await;

        let content = match outcome {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                error!(account_id, tool = %request.kind, "Generation failed: {}", e);
                reservation.release();
                return Err(AppError::GenerationFailed(e.to_string()));
            }
            Err(_) => {
                error!(
                    account_id,
                    tool = %request.kind,
                    "Generation timed out after {:?}",
                    self.generation_timeout
                );
                reservation.release();
                return Err(AppError::GenerationFailed(format!(
                    "timed out after {}s",
                    self.generation_timeout.as_secs_f32()
                )));
            }
        };

        let account = reservation.commit(self.now());
        info!(
            account_id,
            tool = %request.kind,
            daily_generations = account.daily_generations,
            "Generation completed"
        );

        Ok(content)
    }

    /// Persist a generation. Only premium accounts may save; the tier is checked before the
    /// payload is validated.
    pub fn save_generation(
        &self,
        account_id: AccountId,
        save: SaveGeneration,
    ) -> Result<GenerationRecord, AppError> {
        let owner = Account::get(&self.store, account_id)?;
        if !owner.premium {
            return Err(AppError::Forbidden(
                "premium subscription required to save generations".to_string(),
            ));
        }

        if save.prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt must not be empty".to_string()));
        }
        if save.output.trim().is_empty() {
            return Err(AppError::Validation("output must not be empty".to_string()));
        }
        let tool = Tool::get(&self.store, save.tool_id)
            .map_err(|_| AppError::Validation(format!("unknown tool id {}", save.tool_id)))?;

        let title = match save.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => auto_title(&tool.name, &save.output),
        };

        GenerationRecord::create(
            &self.store,
            &owner,
            NewGeneration {
                tool_id: tool.id,
                prompt: save.prompt,
                output: save.output,
                title,
                tags: save.tags,
            },
            self.now(),
        )
    }

    pub fn list_generations(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<GenerationRecord>, AppError> {
        let owner = Account::get(&self.store, account_id)?;
        GenerationRecord::list_for_account(&self.store, &owner)
    }

    pub fn get_generation(
        &self,
        account_id: AccountId,
        id: GenerationId,
    ) -> Result<GenerationRecord, AppError> {
        let record = GenerationRecord::get(&self.store, id)?;
        if record.account_id != account_id {
            return Err(AppError::Forbidden(
                "not authorized to view this generation".to_string(),
            ));
        }
        Ok(record)
    }

    pub fn delete_generation(
        &self,
        account_id: AccountId,
        id: GenerationId,
    ) -> Result<(), AppError> {
        GenerationRecord::delete(&self.store, id, account_id)?;
        info!(account_id, record_id = id, "Generation deleted");
        Ok(())
    }

    pub fn upgrade(&self, account_id: AccountId) -> Result<Account, AppError> {
        self.quota.upgrade(account_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Duration as ChronoDuration;
    use futures::future::join_all;
    use testresult::TestResult;

    use super::*;
    use crate::models::ToolKind;
    use crate::openai::{GeneratorError, MockContentGenerator};
    use crate::test_helpers::{day, free_account, premium_account, ManualClock, SlowGenerator};

    struct Harness {
        store: Arc<Store>,
        clock: Arc<ManualClock>,
        orchestrator: Orchestrator,
    }

    fn harness(generator: impl ContentGenerator + 'static) -> Harness {
        let store = Arc::new(Store::new());
        let clock = Arc::new(ManualClock::new(day(1)));
        let orchestrator = Orchestrator::new(
            store.clone(),
            QuotaPolicy::default(),
            Arc::new(generator),
            clock.clone(),
            Duration::from_millis(200),
        );
        Harness {
            store,
            clock,
            orchestrator,
        }
    }

    fn succeeding() -> MockContentGenerator {
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .returning(|request| Ok(format!("{} output", request.kind)));
        generator
    }

    fn count(h: &Harness, id: AccountId) -> u32 {
        Account::get(&h.store, id)
            .map(|account| account.daily_generations)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn passes_tool_kind_prompt_tone_and_length_to_the_generator() -> TestResult {
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .once()
            .withf(|request| {
                request.kind == ToolKind::TitleCreator
                    && request.prompt == "sourdough"
                    && request.tone == "Witty"
                    && request.length == "Short"
            })
            .returning(|_| Ok("1. Rise Up".to_string()));
        let h = harness(generator);
        let account = free_account(&h.store, "user")?;

        let content = h
            .orchestrator
            .generate(account.id, 2, "sourdough", "Witty", "Short")
            .await?;

        assert_eq!(content, "1. Rise Up");
        assert_eq!(count(&h, account.id), 1);

        Ok(())
    }

    #[tokio::test]
    async fn fourth_generation_of_the_day_is_rejected() -> TestResult {
        let h = harness(succeeding());
        let account = free_account(&h.store, "user")?;

        for _ in 0..3 {
            h.orchestrator
                .generate(account.id, 1, "topic", "Professional", "Standard")
                .await?;
        }
        assert_eq!(count(&h, account.id), 3);

        let fourth = h
            .orchestrator
            .generate(account.id, 1, "topic", "Professional", "Standard")
            .await;

        assert_eq!(fourth, Err(AppError::QuotaExceeded { limit: 3 }));
        assert_eq!(count(&h, account.id), 3);

        Ok(())
    }

    #[tokio::test]
    async fn quota_rejection_never_calls_the_generator() -> TestResult {
        let mut generator = MockContentGenerator::new();
        generator.expect_generate().never();
        let h = harness(generator);
        let account = free_account(&h.store, "user")?;
        for _ in 0..3 {
            h.orchestrator.quota.record_generation(account.id, day(1))?;
        }

        let result = h
            .orchestrator
            .generate(account.id, 1, "topic", "Professional", "Standard")
            .await;

        assert_eq!(result, Err(AppError::QuotaExceeded { limit: 3 }));

        Ok(())
    }

    #[tokio::test]
    async fn quota_comes_back_after_the_day_boundary() -> TestResult {
        let h = harness(succeeding());
        let account = free_account(&h.store, "user")?;
        for _ in 0..3 {
            h.orchestrator
                .generate(account.id, 1, "topic", "Professional", "Standard")
                .await?;
        }

        h.clock.set(day(2) - ChronoDuration::hours(11));
        h.orchestrator
            .generate(account.id, 1, "topic", "Professional", "Standard")
            .await?;

        assert_eq!(count(&h, account.id), 1);
        assert!(h.orchestrator.quota.check_allowed(account.id, h.clock.now())?);

        Ok(())
    }

    #[tokio::test]
    async fn failed_generation_does_not_consume_quota() -> TestResult {
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .once()
            .returning(|_| Err(GeneratorError::EmptyResponse));
        let h = harness(generator);
        let account = free_account(&h.store, "user")?;
        h.orchestrator.quota.record_generation(account.id, day(1))?;

        let result = h
            .orchestrator
            .generate(account.id, 1, "topic", "Professional", "Standard")
            .await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        assert_eq!(count(&h, account.id), 1);

        Ok(())
    }

    #[tokio::test]
    async fn timeout_is_a_generation_failure_and_frees_the_slot() -> TestResult {
        let h = harness(SlowGenerator::new(std::time::Duration::from_secs(5)));
        let account = free_account(&h.store, "user")?;
        h.orchestrator.quota.record_generation(account.id, day(1))?;
        h.orchestrator.quota.record_generation(account.id, day(1))?;

        let result = h
            .orchestrator
            .generate(account.id, 1, "topic", "Professional", "Standard")
            .await;

        assert!(matches!(result, Err(AppError::GenerationFailed(_))));
        assert_eq!(count(&h, account.id), 2);
        assert!(h.orchestrator.quota.reserve(account.id, day(1)).is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found_and_keeps_quota() -> TestResult {
        let mut generator = MockContentGenerator::new();
        generator.expect_generate().never();
        let h = harness(generator);
        let account = free_account(&h.store, "user")?;
        h.orchestrator.quota.record_generation(account.id, day(1))?;
        h.orchestrator.quota.record_generation(account.id, day(1))?;

        let result = h
            .orchestrator
            .generate(account.id, 99, "topic", "Professional", "Standard")
            .await;

        assert_eq!(result, Err(AppError::NotFound("tool")));
        assert!(h.orchestrator.quota.reserve(account.id, day(1)).is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let h = harness(MockContentGenerator::new());

        let result = h
            .orchestrator
            .generate(7, 1, "topic", "Professional", "Standard")
            .await;

        assert_eq!(result, Err(AppError::NotFound("account")));
    }

    #[tokio::test]
    async fn upgrade_mid_session_lifts_the_limit() -> TestResult {
        let h = harness(succeeding());
        let account = free_account(&h.store, "user")?;
        for _ in 0..2 {
            h.orchestrator
                .generate(account.id, 1, "topic", "Professional", "Standard")
                .await?;
        }

        h.orchestrator.upgrade(account.id)?;

        for _ in 0..5 {
            h.orchestrator
                .generate(account.id, 1, "topic", "Professional", "Standard")
                .await?;
        }
        assert_eq!(count(&h, account.id), 7);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_generations_never_overspend() -> TestResult {
        let generator = SlowGenerator::new(std::time::Duration::from_millis(20));
        let calls = generator.calls();
        let h = harness(generator);
        let account_id = free_account(&h.store, "user")?.id;
        h.orchestrator.quota.record_generation(account_id, day(1))?;

        // Two units of headroom left, eight callers.
        let attempts = (0..8).map(|_| {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .generate(account_id, 1, "topic", "Professional", "Standard")
                    .await
            })
        });
        let results = join_all(attempts).await;

        let mut successes = 0;
        let mut rejections = 0;
        for result in results {
            match result? {
                Ok(_) => successes += 1,
                Err(AppError::QuotaExceeded { .. }) => rejections += 1,
                Err(other) => return Err(other.into()),
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(rejections, 6);
        assert_eq!(count(&h, account_id), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        Ok(())
    }

    #[tokio::test]
    async fn save_requires_premium() -> TestResult {
        let h = harness(MockContentGenerator::new());
        let free = free_account(&h.store, "free")?;

        let result = h.orchestrator.save_generation(
            free.id,
            SaveGeneration {
                tool_id: 1,
                prompt: "topic".into(),
                output: "text".into(),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(AppError::Forbidden(_))));

        Ok(())
    }

    #[tokio::test]
    async fn free_account_is_forbidden_even_with_an_invalid_payload() -> TestResult {
        let h = harness(MockContentGenerator::new());
        let free = free_account(&h.store, "free")?;

        for save in [
            SaveGeneration {
                tool_id: 1,
                prompt: "  ".into(),
                output: "text".into(),
                ..Default::default()
            },
            SaveGeneration {
                tool_id: 99,
                prompt: "topic".into(),
                output: "".into(),
                ..Default::default()
            },
        ] {
            let result = h.orchestrator.save_generation(free.id, save);
            assert!(matches!(result, Err(AppError::Forbidden(_))), "{:?}", result);
        }

        Ok(())
    }

    #[tokio::test]
    async fn save_derives_a_title_when_blank() -> TestResult {
        let h = harness(MockContentGenerator::new());
        let owner = premium_account(&h.store, "owner")?;

        let record = h.orchestrator.save_generation(
            owner.id,
            SaveGeneration {
                tool_id: 5,
                prompt: "ask for a raise".into(),
                output: "Dear Sam,\nI hope...".into(),
                title: Some("   ".into()),
                tags: Tags::parse("work, email"),
            },
        )?;

        assert_eq!(record.title, "Email Composer - Dear Sam,");
        assert_eq!(record.tags.as_slice(), ["work", "email"]);
        assert_eq!(record.created_at, day(1));

        Ok(())
    }

    #[tokio::test]
    async fn save_validates_input() -> TestResult {
        let h = harness(MockContentGenerator::new());
        let owner = premium_account(&h.store, "owner")?;
        let base = SaveGeneration {
            tool_id: 1,
            prompt: "topic".into(),
            output: "text".into(),
            title: Some("Title".into()),
            tags: Tags::default(),
        };

        let empty_prompt = SaveGeneration {
            prompt: " ".into(),
            ..base.clone()
        };
        let unknown_tool = SaveGeneration {
            tool_id: 42,
            ..base.clone()
        };

        assert!(matches!(
            h.orchestrator.save_generation(owner.id, empty_prompt),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            h.orchestrator.save_generation(owner.id, unknown_tool),
            Err(AppError::Validation(_))
        ));
        assert_eq!(h.orchestrator.save_generation(owner.id, base)?.title, "Title");

        Ok(())
    }

    #[tokio::test]
    async fn records_are_listed_newest_first_and_owner_scoped() -> TestResult {
        let h = harness(MockContentGenerator::new());
        let owner = premium_account(&h.store, "owner")?;
        let other = premium_account(&h.store, "other")?;
        let save = || SaveGeneration {
            tool_id: 1,
            prompt: "topic".into(),
            output: "text".into(),
            ..Default::default()
        };

        let first = h.orchestrator.save_generation(owner.id, save())?;
        h.clock.set(day(2));
        let second = h.orchestrator.save_generation(owner.id, save())?;
        h.clock.set(day(3));
        let third = h.orchestrator.save_generation(owner.id, save())?;
        h.orchestrator.save_generation(other.id, save())?;

        let ids: Vec<GenerationId> = h
            .orchestrator
            .list_generations(owner.id)?
            .into_iter()
            .map(|record| record.id)
            .collect();

        assert_eq!(ids, vec![third.id, second.id, first.id]);
        assert!(matches!(
            h.orchestrator.get_generation(other.id, first.id),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(h.orchestrator.get_generation(owner.id, first.id)?, first);

        Ok(())
    }

    #[tokio::test]
    async fn delete_is_owner_only_and_happens_once() -> TestResult {
        let h = harness(MockContentGenerator::new());
        let owner = premium_account(&h.store, "owner")?;
        let other = free_account(&h.store, "other")?;
        let record = h.orchestrator.save_generation(
            owner.id,
            SaveGeneration {
                tool_id: 3,
                prompt: "topic".into(),
                output: "summary".into(),
                ..Default::default()
            },
        )?;

        assert!(matches!(
            h.orchestrator.delete_generation(other.id, record.id),
            Err(AppError::Forbidden(_))
        ));
        h.orchestrator.delete_generation(owner.id, record.id)?;
        assert_eq!(
            h.orchestrator.delete_generation(owner.id, record.id),
            Err(AppError::NotFound("generation"))
        );

        Ok(())
    }
}
