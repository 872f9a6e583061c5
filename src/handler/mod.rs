use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub mod middleware;
pub mod stream;
pub mod talks;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(talks::health))
        .route("/talks", post(talks::create_talk))
        .route(
            "/media/{name}",
            get(stream::stream_media).head(stream::head_media),
        )
}
