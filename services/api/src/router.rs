//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the relay: the token
//! exchange route, the liveness probe, and OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, TokenResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_token, handlers::healthz),
    components(schemas(TokenResponse, ErrorResponse)),
    tags(
        (name = "Voxlink API", description = "Ephemeral credential relay for the realtime voice demo")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/api/get-token", post(handlers::get_token))
        .route("/healthz", get(handlers::healthz))
        .with_state(app_state);

    // Merge the stateful routes with the stateless Swagger UI.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
