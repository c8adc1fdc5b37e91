mod v1;

use axum::Router;
use axum::routing::{get, post};
use transport::TransportMode;
use utoipa_axum::router::OpenApiRouter;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes(config))
}

/// Routes outside the JSON API: link pages, downloads and the webhook.
pub fn public_routes(config: &AppConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/get", get(handlers::link::file_page))
        .route("/download", get(handlers::link::download));

    match config.transport.mode {
        TransportMode::Webhook => {
            router.route("/webhook", post(handlers::webhook::receive_update))
        }
        TransportMode::Polling => router,
    }
}
