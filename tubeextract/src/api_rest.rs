//! REST endpoints for metadata resolution and the audio relay
//!
//! Two handlers, both stateless per request:
//! - `POST /video-info` — validate, resolve, return a [`MediaSummary`]
//! - `GET /download` — validate, re-resolve for the title, relay the audio
//!   stream with attachment headers
//!
//! The application mounts this router under `/api`.

use crate::client::MediaResolver;
use crate::error::Error;
use crate::models::{self, MediaSummary};
use crate::reference::MediaReference;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state: the resolution collaborator handle
#[derive(Clone)]
pub struct ExtractorState {
    resolver: Arc<dyn MediaResolver>,
}

impl ExtractorState {
    pub fn new(resolver: Arc<dyn MediaResolver>) -> Self {
        Self { resolver }
    }
}

/// Request body for `POST /api/video-info`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VideoInfoRequest {
    /// YouTube URL to resolve
    pub url: String,
}

/// Query parameters for `GET /api/download`
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct DownloadQuery {
    /// YouTube URL to relay
    pub url: String,
}

/// Error body shared by both endpoints
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Message sent to clients for collaborator failures. The cause is logged
/// server-side only.
const GENERIC_FAILURE: &str = "media extraction failed";

/// HTTP mapping of [`Error`]: 400 for invalid references with the validation
/// message, 500 with a generic body for everything else
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            tracing::error!("extraction failed: {}", self.0);
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// RFC 5987 attr-char set: everything outside
/// `ALPHA / DIGIT / !#$&+-.^_`|~` gets percent-encoded.
const ATTR_CHAR_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `Content-Disposition` value carrying the filename twice: a plain-ASCII
/// quoted form for legacy agents (header values are Latin-1 at best, so
/// non-ASCII characters are replaced) and an RFC 5987 `filename*` parameter
/// with the full UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(filename, ATTR_CHAR_ENCODE);
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

/// Build the extraction API router
pub fn create_router(state: ExtractorState) -> Router {
    Router::new()
        .route("/video-info", post(video_info))
        .route("/download", get(download))
        .with_state(state)
}

/// Resolve metadata for a YouTube URL
#[utoipa::path(
    post,
    path = "/api/video-info",
    tag = "extract",
    request_body = VideoInfoRequest,
    responses(
        (status = 200, description = "Metadata for the referenced video", body = MediaSummary),
        (status = 400, description = "Invalid YouTube URL", body = ErrorResponse),
        (status = 500, description = "Resolution failed", body = ErrorResponse)
    )
)]
pub async fn video_info(
    State(state): State<ExtractorState>,
    Json(request): Json<VideoInfoRequest>,
) -> Result<Json<MediaSummary>, ApiError> {
    let reference = MediaReference::parse(&request.url)?;
    let summary = state.resolver.resolve(&reference).await?;
    Ok(Json(summary))
}

/// Relay the highest-quality audio-only rendition as an MP3 attachment
#[utoipa::path(
    get,
    path = "/api/download",
    tag = "extract",
    params(DownloadQuery),
    responses(
        (status = 200, description = "Audio stream", body = Vec<u8>, content_type = "audio/mpeg"),
        (status = 400, description = "Invalid YouTube URL", body = ErrorResponse),
        (status = 500, description = "Download failed", body = ErrorResponse)
    )
)]
pub async fn download(
    State(state): State<ExtractorState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let reference = MediaReference::parse(&query.url)?;

    // Independent metadata call; nothing is cached between requests.
    let summary = state.resolver.resolve(&reference).await?;
    let filename = models::attachment_filename(&summary.title);

    let stream = state.resolver.open_audio_stream(&reference).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename))
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError(Error::download(e.to_string())))?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AudioByteStream;
    use crate::error::Result;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use bytes::Bytes;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const VALID_URL: &str = "https://www.youtube.com/watch?v=abc123abc12";
    const OTHER_URL: &str = "https://youtu.be/zzz999zzz99";

    /// In-memory resolver recording how often the collaborator is invoked
    struct StubResolver {
        calls: AtomicUsize,
        fail_resolve: bool,
        fail_stream: bool,
        poison_stream: bool,
        title: String,
    }

    impl StubResolver {
        fn ok(title: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_resolve: false,
                fail_stream: false,
                poison_stream: false,
                title: title.to_string(),
            }
        }

        fn failing_resolve() -> Self {
            Self {
                fail_resolve: true,
                ..Self::ok("unused")
            }
        }

        fn failing_stream() -> Self {
            Self {
                fail_stream: true,
                ..Self::ok("Song")
            }
        }

        fn poisoned_stream() -> Self {
            Self {
                poison_stream: true,
                ..Self::ok("Song")
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaResolver for StubResolver {
        async fn resolve(&self, reference: &MediaReference) -> Result<MediaSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_resolve {
                return Err(Error::resolution("stub failure"));
            }
            Ok(MediaSummary {
                title: self.title.clone(),
                author: format!("author-{}", reference.video_id()),
                thumbnail: format!("https://img/{}.jpg", reference.video_id()),
                duration: 212,
                views: 42,
            })
        }

        async fn open_audio_stream(&self, reference: &MediaReference) -> Result<AudioByteStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_stream {
                return Err(Error::download("stub stream failure"));
            }
            let body = Bytes::from(format!("audio:{}", reference.video_id()));
            let items: Vec<std::io::Result<Bytes>> = if self.poison_stream {
                vec![
                    Ok(body),
                    Err(std::io::Error::other("collaborator died mid-stream")),
                ]
            } else {
                vec![Ok(body)]
            };
            Ok(futures::stream::iter(items).boxed())
        }
    }

    fn router(resolver: Arc<StubResolver>) -> Router {
        create_router(ExtractorState::new(resolver))
    }

    fn info_request(url: &str) -> Request<Body> {
        let body = serde_json::to_vec(&VideoInfoRequest {
            url: url.to_string(),
        })
        .unwrap();
        Request::builder()
            .method("POST")
            .uri("/video-info")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn download_request(url: &str) -> Request<Body> {
        let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
        Request::builder()
            .method("GET")
            .uri(format!("/download?url={encoded}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_without_collaborator_calls() {
        let resolver = Arc::new(StubResolver::ok("Song"));

        let response = router(resolver.clone())
            .oneshot(info_request("not-a-url"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid YouTube URL"));

        let response = router(resolver.clone())
            .oneshot(download_request("not-a-url"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn video_info_returns_all_summary_fields() {
        let resolver = Arc::new(StubResolver::ok("Some Song"));
        let response = router(resolver.clone())
            .oneshot(info_request(VALID_URL))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Some Song");
        assert_eq!(body["author"], "author-abc123abc12");
        assert_eq!(body["thumbnail"], "https://img/abc123abc12.jpg");
        assert_eq!(body["duration"], 212);
        assert_eq!(body["views"], 42);
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn resolution_failure_is_a_generic_500() {
        let resolver = Arc::new(StubResolver::failing_resolve());
        let response = router(resolver)
            .oneshot(info_request(VALID_URL))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], GENERIC_FAILURE);
        assert!(body.get("title").is_none());
    }

    #[tokio::test]
    async fn download_sets_attachment_headers_and_relays_bytes() {
        let resolver = Arc::new(StubResolver::ok("Cool Song (Official)!!"));
        let response = router(resolver.clone())
            .oneshot(download_request(VALID_URL))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "audio/mpeg"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Cool Song Official.mp3\"; \
             filename*=UTF-8''Cool%20Song%20Official.mp3"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"audio:abc123abc12");
        // One metadata call plus one stream call, nothing cached.
        assert_eq!(resolver.calls(), 2);
    }

    #[test]
    fn content_disposition_keeps_non_ascii_in_the_extended_parameter() {
        assert_eq!(
            content_disposition("été à Paris.mp3"),
            "attachment; filename=\"_t_ _ Paris.mp3\"; \
             filename*=UTF-8''%C3%A9t%C3%A9%20%C3%A0%20Paris.mp3"
        );
    }

    #[tokio::test]
    async fn unicode_title_downloads_with_a_usable_filename() {
        let resolver = Arc::new(StubResolver::ok("été à Paris"));
        let response = router(resolver)
            .oneshot(download_request(VALID_URL))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap();
        // The quoted fallback stays ASCII; the full name rides in filename*.
        assert!(value.is_ascii());
        assert!(value.contains("filename*=UTF-8''%C3%A9t%C3%A9%20%C3%A0%20Paris.mp3"));
    }

    #[tokio::test]
    async fn download_failure_before_streaming_is_a_500() {
        let resolver = Arc::new(StubResolver::failing_stream());
        let response = router(resolver)
            .oneshot(download_request(VALID_URL))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn mid_stream_failure_poisons_the_body() {
        let resolver = Arc::new(StubResolver::poisoned_stream());
        let response = router(resolver)
            .oneshot(download_request(VALID_URL))
            .await
            .unwrap();

        // Headers were already committed as a success...
        assert_eq!(response.status(), StatusCode::OK);
        // ...but collecting the body must fail, not end cleanly.
        assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_interfere() {
        let resolver = Arc::new(StubResolver::ok("Song"));
        let app = router(resolver);

        let (a, b) = tokio::join!(
            app.clone().oneshot(info_request(VALID_URL)),
            app.clone().oneshot(info_request(OTHER_URL)),
        );

        let a = body_json(a.unwrap()).await;
        let b = body_json(b.unwrap()).await;
        assert_eq!(a["author"], "author-abc123abc12");
        assert_eq!(b["author"], "author-zzz999zzz99");
    }
}
