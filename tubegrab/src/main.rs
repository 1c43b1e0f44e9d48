//! tubegrab — YouTube to MP3 relay service
//!
//! Wires the extraction API and the embedded web client onto the HTTP server:
//! resolve metadata with `POST /api/video-info`, relay audio with
//! `GET /api/download`, browse the client at `/`.

use std::sync::Arc;

use rust_embed::RustEmbed;
use tracing::{info, warn};
use tubeextract::api_rest::{ExtractorState, create_router};
use tubeextract::openapi::ApiDoc;
use tubeextract::YtDlpClient;
use tubeserver::{ServerBuilder, get_config, init_logging};
use utoipa::OpenApi;

/// Static web client served at the site root
#[derive(RustEmbed, Clone)]
#[folder = "webapp/"]
struct Webapp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = get_config();

    // ========== Resolution collaborator ==========
    let client = YtDlpClient::builder()
        .binary(config.ytdlp_path())
        .resolve_timeout(config.resolve_timeout())
        .build();
    if client.is_available().await {
        info!("yt-dlp available at '{}'", config.ytdlp_path());
    } else {
        warn!(
            "yt-dlp not found at '{}'; extraction requests will fail until it is installed",
            config.ytdlp_path()
        );
    }
    let state = ExtractorState::new(Arc::new(client));

    // ========== HTTP surface ==========
    let mut server = ServerBuilder::new_configured().build();

    server
        .add_openapi(create_router(state), ApiDoc::openapi(), "extract")
        .await;

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "tubegrab",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    server.add_spa::<Webapp>("/").await;

    server.start().await?;
    info!("ready: {}", config.base_url());
    server.wait().await;

    Ok(())
}
