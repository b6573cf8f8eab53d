use std::sync::Arc;

use actix_web::{post, web};
use tracing::info;

use crate::error::{AppError, ErrorBody};
use crate::middleware::auth::AuthenticatedUser;
use crate::types::UpgradeResponse;
use crate::AppState;

/// Flip the caller to premium. Payment capture happens upstream; repeating the call is a no-op.
#[utoipa::path(
    context_path = "/api",
    tag = "account",
    responses(
        (status = 200, body = UpgradeResponse),
        (status = 401, body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[post("/upgrade")]
pub async fn upgrade(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<UpgradeResponse>, AppError> {
    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    let account = orchestrator.upgrade(account.id)?;
    info!(account_id = account.id, "Upgrade request completed");

    Ok(web::Json(UpgradeResponse {
        message: "Upgrade successful".to_string(),
        account,
    }))
}
