use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::AppError;
use crate::synthesis::SynthesisRequest;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTalkParams {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source_image_url: String,
    pub output_file_name: Option<String>,
}

/// Runs one synthesis job to completion and reports the committed file.
/// Responds only once the file is verified and servable.
pub async fn create_talk(
    State(state): State<AppState>,
    Json(params): Json<CreateTalkParams>,
) -> Result<Response, AppError> {
    let output_file_name = params
        .output_file_name
        .unwrap_or_else(|| format!("{}.mp4", Uuid::new_v4()));
    let request = SynthesisRequest {
        text: params.text,
        source_image_url: params.source_image_url,
        output_file_name,
    };

    info!("talks: synthesis requested for {}", request.output_file_name);
    let media = state.synthesizer.synthesize(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "name": media.name,
            "size": media.size,
            "url": format!("/media/{}", media.name),
        })),
    )
        .into_response())
}

pub async fn health() -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::version::get_short_version(),
    }))
    .into_response()
}
