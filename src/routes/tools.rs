use std::sync::Arc;

use actix_web::{get, web};

use crate::error::{AppError, ErrorBody};
use crate::models::Tool;
use crate::store::ToolId;
use crate::AppState;

#[utoipa::path(
    context_path = "/api",
    tag = "tools",
    responses((status = 200, description = "The tool catalog", body = [Tool]))
)]
#[get("/tools")]
pub async fn list_tools(app_state: web::Data<Arc<AppState>>) -> web::Json<Vec<Tool>> {
    web::Json(Tool::list(&app_state.store))
}

#[utoipa::path(
    context_path = "/api",
    tag = "tools",
    params(("tool_id" = i64, Path, description = "Catalog tool id")),
    responses(
        (status = 200, body = Tool),
        (status = 404, body = ErrorBody),
    )
)]
#[get("/tools/{tool_id}")]
pub async fn get_tool(
    app_state: web::Data<Arc<AppState>>,
    tool_id: web::Path<ToolId>,
) -> Result<web::Json<Tool>, AppError> {
    let tool = Tool::get(&app_state.store, tool_id.into_inner())?;
    Ok(web::Json(tool))
}
