use std::sync::Arc;

use actix_web::{post, web};
use tracing::info;

use crate::error::{AppError, ErrorBody};
use crate::middleware::auth::AuthenticatedUser;
use crate::types::{GenerateRequest, GenerateResponse};
use crate::AppState;

/// Generate content with a catalog tool. Free accounts get a fixed number per calendar day.
#[utoipa::path(
    context_path = "/api",
    tag = "generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, body = GenerateResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 403, description = "Daily limit reached", body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 500, description = "Generator failed", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[post("/generate")]
pub async fn generate(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    request: web::Json<GenerateRequest>,
) -> Result<web::Json<GenerateResponse>, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    info!(
        account_id = account.id,
        tool_id = request.tool_id,
        "Generate request"
    );

    let content = orchestrator
        .generate(
            account.id,
            request.tool_id,
            &request.prompt,
            request.tone(),
            request.length(),
        )
        .await?;

    Ok(web::Json(GenerateResponse { content }))
}
