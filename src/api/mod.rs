//! HTTP surface: system endpoints, the WebSocket route, and the OpenAPI
//! document.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "collab-gateway"),
    paths(handlers::system::health_handler, handlers::system::events_handler),
    tags((name = "System", description = "Health and protocol metadata"))
)]
pub struct ApiDoc;

/// Builds the complete router: system endpoints, `/ws`, and API docs.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::system::routes())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    );

    router
}
