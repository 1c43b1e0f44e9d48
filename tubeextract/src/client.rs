//! Driver for the yt-dlp collaborator
//!
//! [`YtDlpClient`] shells out to the `yt-dlp` binary for both operations:
//! metadata via `--dump-single-json`, audio via `-f bestaudio/best -o -` with
//! the child's stdout relayed as a byte stream. The client is stateless; one
//! child process exists per in-flight operation.
//!
//! The relay is a bounded hand-off: bytes are pulled from the child only as
//! fast as the HTTP consumer drains them, with the OS pipe buffer as the only
//! intermediate storage.
//!
//! [`MediaResolver`] is the seam the HTTP handlers depend on, so API tests can
//! substitute a stub without spawning anything.

use crate::error::{Error, Result};
use crate::models::{MediaSummary, VideoInfo};
use crate::reference::MediaReference;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Default collaborator binary, resolved through `PATH`
pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";

/// Default deadline for metadata resolution and stream startup (30 seconds)
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 30;

/// Format selector for the relay: best audio-only rendition, best overall
/// as a fallback for media without a separate audio track
const AUDIO_FORMAT: &str = "bestaudio/best";

/// Read granularity for the stdout pipe
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Cap on collaborator stderr quoted into error messages
const STDERR_EXCERPT_LEN: usize = 300;

/// Byte stream of an audio-only rendition, relayed as it arrives.
///
/// An `Err` item after bytes have flowed means the transfer is truncated; the
/// HTTP layer must abort the connection rather than end the body cleanly.
pub type AudioByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Resolution collaborator seam between the HTTP handlers and yt-dlp
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Fetch metadata for a validated reference
    async fn resolve(&self, reference: &MediaReference) -> Result<MediaSummary>;

    /// Open the highest-quality audio-only rendition as a byte stream
    async fn open_audio_stream(&self, reference: &MediaReference) -> Result<AudioByteStream>;
}

/// Client for the yt-dlp binary
///
/// Stateless and cheap to clone. Construction never touches the binary; use
/// [`YtDlpClient::is_available`] to probe it at startup.
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    binary: PathBuf,
    resolve_timeout: Duration,
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl YtDlpClient {
    /// Create a client with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The configured collaborator binary
    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }

    /// Probe whether the collaborator binary can be executed
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Fetch and parse `--dump-single-json` metadata for `reference`
    pub async fn fetch_info(&self, reference: &MediaReference) -> Result<VideoInfo> {
        let mut cmd = self.base_command();
        cmd.arg("--dump-single-json")
            .arg("--skip-download")
            .arg(reference.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("resolving metadata for {}", reference.video_id());
        let output = timeout(self.resolve_timeout, cmd.output())
            .await
            .map_err(|_| Error::Timeout(self.resolve_timeout))??;

        if !output.status.success() {
            return Err(Error::resolution(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr_excerpt(&output.stderr)
            )));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    /// Spawn the relay child and hand back its stdout as a monitored stream.
    ///
    /// The first chunk is awaited here (bounded by the resolve timeout) so
    /// collaborator failures before any byte is produced surface as
    /// [`Error::Download`] while response headers can still carry a status.
    pub async fn open_stream(&self, reference: &MediaReference) -> Result<AudioByteStream> {
        let mut cmd = self.base_command();
        cmd.arg("-f")
            .arg(AUDIO_FORMAT)
            .arg("-o")
            .arg("-")
            .arg(reference.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("opening audio stream for {}", reference.video_id());
        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::download("child stdout was not captured"))?;
        let stderr = child.stderr.take();

        // Drain stderr concurrently; quoting it is only useful for startup
        // failures, afterwards it is discarded with the task.
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let mut reader = ReaderStream::with_capacity(stdout, STREAM_CHUNK_SIZE);
        let first = timeout(self.resolve_timeout, reader.next())
            .await
            .map_err(|_| Error::Timeout(self.resolve_timeout))?;

        let first = match first {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return Err(Error::Spawn(e)),
            None => {
                let status = child.wait().await?;
                let stderr = stderr_task.await.unwrap_or_default();
                return Err(Error::download(format!(
                    "yt-dlp produced no output ({status}): {}",
                    stderr_excerpt(&stderr)
                )));
            }
        };

        Ok(monitored_stream(first, reader, child))
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-warnings")
            .arg("--no-progress")
            .arg("--no-playlist")
            // Dropping the stream (client disconnect, timeout) must tear the
            // child down, not leave it extracting into a dead pipe.
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MediaResolver for YtDlpClient {
    async fn resolve(&self, reference: &MediaReference) -> Result<MediaSummary> {
        Ok(self.fetch_info(reference).await?.into())
    }

    async fn open_audio_stream(&self, reference: &MediaReference) -> Result<AudioByteStream> {
        self.open_stream(reference).await
    }
}

/// Builder for [`YtDlpClient`]
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    binary: PathBuf,
    resolve_timeout: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_YTDLP_BIN),
            resolve_timeout: Duration::from_secs(DEFAULT_RESOLVE_TIMEOUT_SECS),
        }
    }
}

impl ClientBuilder {
    /// Path to the yt-dlp binary
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Deadline for metadata resolution and stream startup
    pub fn resolve_timeout(mut self, resolve_timeout: Duration) -> Self {
        self.resolve_timeout = resolve_timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> YtDlpClient {
        YtDlpClient {
            binary: self.binary,
            resolve_timeout: self.resolve_timeout,
        }
    }
}

/// Relay `reader` after the probed `first` chunk, then verify the child's
/// exit status so a mid-stream collaborator failure is surfaced as a stream
/// error instead of a clean-looking short transfer.
fn monitored_stream(
    first: Bytes,
    mut reader: ReaderStream<ChildStdout>,
    mut child: Child,
) -> AudioByteStream {
    let stream = async_stream::stream! {
        yield Ok(first);
        while let Some(chunk) = reader.next().await {
            let failed = chunk.is_err();
            yield chunk;
            if failed {
                return;
            }
        }
        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                yield Err(std::io::Error::other(format!(
                    "yt-dlp exited with {status} mid-stream"
                )));
            }
            Err(e) => yield Err(e),
        }
    };
    stream.boxed()
}

/// Last non-empty stderr line, truncated for log and error hygiene
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();
    if line.len() > STDERR_EXCERPT_LEN {
        let mut end = STDERR_EXCERPT_LEN;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &line[..end])
    } else {
        line.to_string()
    }
}
