pub mod browse;
pub mod gate;
pub mod response;
pub mod state;
pub mod stream;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use crate::http::state::AppState;

/// Subsonic route table. Every request, matched or not, passes through the
/// gate first; only authenticated requests reach a handler or the 404 fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/rest/getLicense.view", get(browse::get_license).post(browse::get_license))
        .route("/rest/getIndexes.view", get(browse::get_indexes).post(browse::get_indexes))
        .route(
            "/rest/getMusicDirectory.view",
            get(browse::get_music_directory).post(browse::get_music_directory),
        )
        .route(
            "/rest/getMusicFolders.view",
            get(browse::get_music_folders).post(browse::get_music_folders),
        )
        .route("/rest/ping.view", get(browse::ping).post(browse::ping))
        .route("/rest/stream.view", get(stream::stream).post(stream::stream))
        .layer(middleware::from_fn_with_state(state.clone(), gate::gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
