use std::sync::Arc;

use actix_web::{get, web};

use crate::error::{AppError, ErrorBody};
use crate::middleware::auth::AuthenticatedUser;
use crate::types::AccountResponse;
use crate::AppState;

/// The caller's account with today's quota usage. Registers the account on first use.
#[utoipa::path(
    context_path = "/api",
    tag = "account",
    responses(
        (status = 200, body = AccountResponse),
        (status = 401, body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
#[get("/user")]
pub async fn current_user(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<web::Json<AccountResponse>, AppError> {
    let orchestrator = &app_state.orchestrator;
    let account = orchestrator.account_for(&authenticated_user)?;

    Ok(web::Json(AccountResponse::new(
        account,
        orchestrator.policy(),
        orchestrator.now(),
    )))
}
