use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let router = OpenApiRouter::new().routes(routes!(handlers::files::get_file));

    if config.server.public_listing {
        router.routes(routes!(handlers::files::list_owner_files))
    } else {
        router
    }
}
