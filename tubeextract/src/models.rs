//! Data models for yt-dlp output and API responses
//!
//! [`VideoInfo`] mirrors the subset of `yt-dlp --dump-single-json` output we
//! consume; [`MediaSummary`] is the immutable, serializable view returned by
//! the API. Unknown JSON fields are ignored so newer yt-dlp releases do not
//! break parsing.

use serde::{Deserialize, Serialize};

/// One entry of the collaborator's thumbnail list
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailInfo {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl ThumbnailInfo {
    /// Pixel area used for "largest thumbnail" selection. Entries without
    /// dimensions rank lowest.
    fn pixel_area(&self) -> u64 {
        match (self.width, self.height) {
            (Some(w), Some(h)) => u64::from(w) * u64::from(h),
            _ => 0,
        }
    }
}

/// Subset of the metadata yt-dlp reports for a single video
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Seconds; yt-dlp reports fractional durations for some formats
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    /// Single fallback thumbnail, present even when `thumbnails` is empty
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<ThumbnailInfo>,
}

impl VideoInfo {
    /// Channel name, falling back to the legacy `uploader` field
    pub fn author(&self) -> &str {
        self.channel
            .as_deref()
            .or(self.uploader.as_deref())
            .unwrap_or("Unknown")
    }

    /// URL of the highest-resolution thumbnail.
    ///
    /// Explicit maximum over the full list rather than trusting any upstream
    /// ordering. Ties (including a list with no dimensions at all) resolve to
    /// the later entry, which is where upstream puts its best guess.
    pub fn best_thumbnail(&self) -> Option<&str> {
        self.thumbnails
            .iter()
            .enumerate()
            .max_by_key(|(index, thumb)| (thumb.pixel_area(), *index))
            .map(|(_, thumb)| thumb.url.as_str())
            .or(self.thumbnail.as_deref())
    }
}

/// Metadata returned by `POST /api/video-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MediaSummary {
    /// Video title
    pub title: String,
    /// Channel name
    pub author: String,
    /// Highest-resolution thumbnail URL
    pub thumbnail: String,
    /// Duration in seconds
    pub duration: u64,
    /// View count
    pub views: u64,
}

impl From<VideoInfo> for MediaSummary {
    fn from(info: VideoInfo) -> Self {
        Self {
            author: info.author().to_string(),
            thumbnail: info.best_thumbnail().unwrap_or_default().to_string(),
            duration: info.duration.unwrap_or(0.0).round() as u64,
            views: info.view_count.unwrap_or(0),
            title: info.title,
        }
    }
}

/// Strip a title down to the alphanumeric/whitespace/hyphen set and trim
/// surrounding whitespace. Idempotent.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Attachment filename for a relayed stream: sanitized title plus the fixed
/// audio extension. An empty sanitized title falls back to `audio`.
pub fn attachment_filename(title: &str) -> String {
    let sanitized = sanitize_title(title);
    if sanitized.is_empty() {
        "audio.mp3".to_string()
    } else {
        format!("{sanitized}.mp3")
    }
}
