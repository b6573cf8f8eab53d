use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};
use tracing::info;

use crate::error::{AppError, ErrorBody};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::GenerationRecord;
use crate::store::GenerationId;
use crate::types::{AckResponse, CreateGenerationRequest};
use crate::AppState;

/// Save a generation. Premium accounts only.
#[utoipa::path(
    context_path = "/api",
    tag = "generations",
    request_body = CreateGenerationRequest,
    responses(
        (status = 201, body = GenerationRecord),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 403, description = "Account is not premium", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[post("/generations")]
pub async fn create_generation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    request: web::Json<CreateGenerationRequest>,
) -> Result<HttpResponse, AppError> {
    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    let record = orchestrator.save_generation(account.id, request.into_inner().into())?;
    info!(
        account_id = account.id,
        record_id = record.id,
        tool_id = record.tool_id,
        "Generation saved"
    );

    Ok(HttpResponse::Created().json(record))
}

/// The caller's saved generations, newest first. Premium accounts only.
#[utoipa::path(
    context_path = "/api",
    tag = "generations",
    responses(
        (status = 200, body = [GenerationRecord]),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[get("/generations")]
pub async fn list_generations(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<Vec<GenerationRecord>>, AppError> {
    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    Ok(web::Json(orchestrator.list_generations(account.id)?))
}

#[utoipa::path(
    context_path = "/api",
    tag = "generations",
    params(("generation_id" = i64, Path)),
    responses(
        (status = 200, body = GenerationRecord),
        (status = 403, description = "Owned by another account", body = ErrorBody),
        (status = 404, body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[get("/generations/{generation_id}")]
pub async fn get_generation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    generation_id: web::Path<GenerationId>,
) -> Result<web::Json<GenerationRecord>, AppError> {
    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    let record = orchestrator.get_generation(account.id, generation_id.into_inner())?;
    Ok(web::Json(record))
}

/// Delete one of the caller's generations. Deleting it again reports not found.
#[utoipa::path(
    context_path = "/api",
    tag = "generations",
    params(("generation_id" = i64, Path)),
    responses(
        (status = 200, body = AckResponse),
        (status = 403, description = "Owned by another account", body = ErrorBody),
        (status = 404, body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[delete("/generations/{generation_id}")]
pub async fn delete_generation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    generation_id: web::Path<GenerationId>,
) -> Result<web::Json<AckResponse>, AppError> {
    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    orchestrator.delete_generation(account.id, generation_id.into_inner())?;

    Ok(web::Json(AckResponse {
        message: "Generation deleted successfully".to_string(),
    }))
}
