use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::Account;
use crate::store::{AccountId, GenerationId, Store, ToolId};

const AUTO_TITLE_CHARS: usize = 30;

/// Free-text labels; comma-delimited at the interface boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn parse(raw: &str) -> Self {
        Tags(
            raw.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&self.as_slice().join(","))
        }
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Tags::parse).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationRecord {
    pub id: GenerationId,
    pub account_id: AccountId,
    pub tool_id: ToolId,
    pub prompt: String,
    pub output: String,
    pub title: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "marketing,launch")]
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when saving a generation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneration {
    pub tool_id: ToolId,
    pub prompt: String,
    pub output: String,
    pub title: String,
    pub tags: Tags,
}

impl GenerationRecord {
    /// Persist a generation for `owner`. The caller passes the owner's current state; the
    /// premium gate is evaluated against it and never re-checked afterwards.
    pub fn create(
        store: &Store,
        owner: &Account,
        new_generation: NewGeneration,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        if !owner.premium {
            return Err(AppError::Forbidden(
                "premium subscription required to save generations".to_string(),
            ));
        }

        let mut table = store.generations().write();
        let (id, created_at) = table.allocate(now);
        let record = GenerationRecord {
            id,
            account_id: owner.id,
            tool_id: new_generation.tool_id,
            prompt: new_generation.prompt,
            output: new_generation.output,
            title: new_generation.title,
            tags: new_generation.tags,
            created_at,
        };
        table.rows.insert(id, record.clone());

        debug!(account_id = owner.id, record_id = id, "Generation saved");
        Ok(record)
    }

    /// Records owned by `owner`, newest first. Ties keep insertion order.
    pub fn list_for_account(store: &Store, owner: &Account) -> Result<Vec<Self>, AppError> {
        if !owner.premium {
            return Err(AppError::Forbidden(
                "premium subscription required to retrieve saved generations".to_string(),
            ));
        }

        let mut records: Vec<GenerationRecord> = store
            .generations()
            .read()
            .rows
            .values()
            .filter(|record| record.account_id == owner.id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(records)
    }

    pub fn get(store: &Store, id: GenerationId) -> Result<Self, AppError> {
        store
            .generations()
            .read()
            .rows
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound("generation"))
    }

    pub fn delete(
        store: &Store,
        id: GenerationId,
        requesting_account_id: AccountId,
    ) -> Result<(), AppError> {
        let mut table = store.generations().write();
        let owner = table
            .rows
            .get(&id)
            .map(|record| record.account_id)
            .ok_or(AppError::NotFound("generation"))?;

        if owner != requesting_account_id {
            warn!(
                record_id = id,
                account_id = requesting_account_id,
                "Refusing to delete a generation owned by another account"
            );
            return Err(AppError::Forbidden(
                "not authorized to delete this generation".to_string(),
            ));
        }

        table.rows.remove(&id);
        Ok(())
    }
}

/// `"<tool name> - <first output line>"`, with the line cut at 30 characters.
pub fn auto_title(tool_name: &str, output: &str) -> String {
    let first_line = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let snippet = if first_line.chars().count() > AUTO_TITLE_CHARS {
        let cut: String = first_line.chars().take(AUTO_TITLE_CHARS).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    };

    format!("{} - {}", tool_name, snippet).trim().to_string()
}
