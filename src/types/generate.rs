use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::prompts::Prompts;
use crate::store::ToolId;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub tool_id: ToolId,
    pub prompt: String,
    #[schema(example = "Professional")]
    pub tone: Option<String>,
    #[schema(example = "Standard")]
    pub length: Option<String>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn tone(&self) -> &str {
        non_blank(self.tone.as_deref()).unwrap_or(Prompts::DEFAULT_TONE)
    }

    pub fn length(&self) -> &str {
        non_blank(self.length.as_deref()).unwrap_or(Prompts::DEFAULT_LENGTH)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub content: String,
}
