use crate::config::Config;
use crate::handler;
use crate::handler::middleware::request_log::log_requests;
use crate::media::{FfprobeProbe, MediaStore};
use crate::synthesis::{DidTalkClient, Synthesizer};
use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub store: MediaStore,
    pub synthesizer: Arc<Synthesizer>,
    pub token: CancellationToken,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub synthesizer: Option<Arc<Synthesizer>>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            synthesizer: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Swap in a preassembled pipeline, for embedding and tests.
    pub fn synthesizer(mut self, synthesizer: Arc<Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub async fn build(self) -> Result<AppState> {
        let config = Arc::new(self.config.unwrap_or_default());
        let token = CancellationToken::new();
        let store = MediaStore::new(&config.media_dir);
        store.ensure_dirs().await?;
        store.sweep_staging().await?;

        let synthesizer = if let Some(synthesizer) = self.synthesizer {
            synthesizer
        } else {
            let synthesis = config.synthesis.clone();
            let api_key = synthesis
                .api_key
                .clone()
                .or_else(|| std::env::var("DID_API_KEY").ok())
                .unwrap_or_default();
            let client = Arc::new(DidTalkClient::new(synthesis.clone(), api_key));
            Arc::new(
                Synthesizer::new(client, Arc::new(FfprobeProbe), store.clone())
                    .with_poll_interval(Duration::from_millis(synthesis.poll_interval_ms))
                    .with_deadline(Duration::from_secs(synthesis.deadline_secs)),
            )
        };

        Ok(Arc::new(AppStateInner {
            config,
            store,
            synthesizer,
            token,
        }))
    }
}

pub async fn run(state: AppState) -> Result<()> {
    let token = state.token.clone();

    let app = create_router(state.clone());
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(anyhow::anyhow!("Failed to bind to {}: {}", addr, e));
        }
    };

    let http_task = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    select! {
        http_result = http_task => {
            match http_result {
                Ok(_) => info!("Server shut down gracefully"),
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    return Err(anyhow::anyhow!("Server error: {}", e));
                }
            }
        }
        _ = token.cancelled() => {
            info!("Application shutting down due to cancellation");
        }
    }
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration to allow cross-origin playback and range probes
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::HEAD,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
            axum::http::header::RANGE,
        ])
        .expose_headers([
            axum::http::header::CONTENT_RANGE,
            axum::http::header::ACCEPT_RANGES,
            axum::http::header::CONTENT_LENGTH,
        ]);

    let skip_paths = Arc::new(vec!["/health".to_string()]);
    let api_routes = handler::router().with_state(state);

    Router::new()
        .merge(api_routes)
        .layer(axum::middleware::from_fn_with_state(skip_paths, log_requests))
        .layer(cors)
}
