//! yt-dlp client library for tubegrab
//!
//! This crate wraps the `yt-dlp` binary as a resolution collaborator and
//! exposes the two-endpoint REST API built on it.
//!
//! # Features
//!
//! - **Reference validation**: YouTube URL shape checks with no network
//!   activity ([`MediaReference`])
//! - **Metadata resolution**: title, author, thumbnail, duration and view
//!   count via `--dump-single-json` ([`YtDlpClient::fetch_info`])
//! - **Audio relay**: highest-quality audio-only rendition streamed from the
//!   child's stdout, with mid-stream failure detection
//!   ([`YtDlpClient::open_stream`])
//! - **HTTP surface**: axum router for `POST /video-info` and `GET /download`
//!   ([`api_rest::create_router`]), documented in [`openapi::ApiDoc`]
//!
//! # Example
//!
//! ```no_run
//! use tubeextract::{MediaReference, YtDlpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = YtDlpClient::new();
//!     let reference = MediaReference::parse("https://youtu.be/dQw4w9WgXcQ")?;
//!
//!     let info = client.fetch_info(&reference).await?;
//!     println!("{} by {}", info.title, info.author());
//!
//!     Ok(())
//! }
//! ```

pub mod api_rest;
pub mod client;
pub mod error;
pub mod models;
pub mod openapi;
pub mod reference;

pub use client::{AudioByteStream, ClientBuilder, MediaResolver, YtDlpClient};
pub use error::{Error, Result};
pub use models::{attachment_filename, sanitize_title, MediaSummary, VideoInfo};
pub use reference::MediaReference;
