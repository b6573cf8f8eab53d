use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Tags;
use crate::orchestrator::SaveGeneration;
use crate::store::ToolId;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGenerationRequest {
    pub tool_id: ToolId,
    pub prompt: String,
    pub output: String,
    /// Derived from the tool name and output when missing or blank.
    pub title: Option<String>,
    /// Comma-delimited.
    #[schema(example = "marketing,launch")]
    pub tags: Option<String>,
}

impl From<CreateGenerationRequest> for SaveGeneration {
    fn from(request: CreateGenerationRequest) -> Self {
        SaveGeneration {
            tool_id: request.tool_id,
            prompt: request.prompt,
            output: request.output,
            title: request.title,
            tags: request.tags.as_deref().map(Tags::parse).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    pub message: String,
}
