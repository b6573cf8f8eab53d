use std::sync::Arc;

use actix_cors::Cors;
use actix_web::web;
use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::SecretStore;
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use crate::auth::JWTKeys;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::auth::Authentication;
use crate::openai::{ContentGenerator, OpenAiGenerator};
use crate::orchestrator::Orchestrator;
use crate::store::Store;

mod auth;
mod clock;
mod config;
mod error;
mod middleware;
mod models;
mod openai;
mod orchestrator;
mod prompts;
mod quota;
mod routes;
mod store;
#[cfg(test)]
mod test_helpers;
mod types;

pub struct AppState {
    pub store: Arc<Store>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(
        app_config: &AppConfig,
        store: Arc<Store>,
        generator: Arc<dyn ContentGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            store.clone(),
            app_config.quota_policy(),
            generator,
            clock,
            app_config.generation_timeout,
        );

        AppState {
            store,
            orchestrator,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::tools::list_tools,
        routes::tools::get_tool,
        routes::generate::generate,
        routes::generations::create_generation,
        routes::generations::list_generations,
        routes::generations::get_generation,
        routes::generations::delete_generation,
        routes::auth::current_user,
        routes::pay::upgrade,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "tools", description = "Content tool catalog"),
        (name = "generate", description = "Quota-limited content generation"),
        (name = "generations", description = "Saved generations (premium)"),
        (name = "account", description = "Account and subscription"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn api_config(
    app_state: Arc<AppState>,
    jwt_keys: JWTKeys,
) -> impl FnOnce(&mut web::ServiceConfig) + Send + Clone + 'static {
    move |cfg: &mut web::ServiceConfig| {
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into());
        let path_config = web::PathConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into());

        cfg.app_data(web::Data::new(app_state))
            .app_data(json_config)
            .app_data(path_config)
            .service(
                web::scope("/api")
                    .wrap(Authentication { jwt_keys })
                    .wrap(Cors::permissive())
                    .service(routes::tools::list_tools)
                    .service(routes::tools::get_tool)
                    .service(routes::generate::generate)
                    .service(routes::generations::create_generation)
                    .service(routes::generations::list_generations)
                    .service(routes::generations::get_generation)
                    .service(routes::generations::delete_generation)
                    .service(routes::auth::current_user)
                    .service(routes::pay::upgrade),
            )
            .service(Scalar::with_url("/docs", ApiDoc::openapi()));
    }
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secret_store: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut web::ServiceConfig) + Send + Clone + 'static> {
    let app_config = AppConfig::new(&secret_store)?;

    let store = Arc::new(Store::new());
    let generator = Arc::new(OpenAiGenerator::new(&app_config));
    let app_state = Arc::new(AppState::new(
        &app_config,
        store,
        generator,
        Arc::new(SystemClock),
    ));
    let jwt_keys = JWTKeys::new(app_config.jwt_secret.as_bytes());

    info!(
        model = %app_config.openai_model,
        free_daily_limit = app_config.free_daily_limit,
        "Starting content service"
    );

    Ok(api_config(app_state, jwt_keys).into())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
    use actix_web::App;
    use testresult::TestResult;

    use super::*;
    use crate::openai::MockContentGenerator;
    use crate::test_helpers::test_app;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/tools",
            "/api/tools/{tool_id}",
            "/api/generate",
            "/api/generations",
            "/api/generations/{generation_id}",
            "/api/user",
            "/api/upgrade",
        ] {
            assert!(paths.iter().any(|path| *path == expected), "{}", expected);
        }
    }

    #[actix_web::test]
    async fn malformed_json_is_a_validation_error() -> TestResult {
        let (state, keys) = test_app(MockContentGenerator::new());
        let token = crate::test_helpers::bearer("user_01")?;
        let app = init_service(App::new().configure(api_config(state, keys))).await;

        let response = call_service(
            &app,
            TestRequest::post()
                .uri("/api/generate")
                .insert_header(("Authorization", token.as_str()))
                .insert_header(("Content-Type", "application/json"))
                .set_payload("{not json")
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_body_json(response).await;
        assert_eq!(body["kind"], "validation_error");

        Ok(())
    }
}
