pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers::handle_screen;
use crate::selections::handlers::{handle_load_selections, handle_save_selections};
use crate::state::AppState;

/// Headroom for multipart framing and the `jd_text` field.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Per-file size is checked by the handler; this only caps the whole request.
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(crate::screening::session::MAX_FILES)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/screen", post(handle_screen))
        .route(
            "/selections",
            post(handle_save_selections).get(handle_load_selections),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
