//! Validated YouTube references
//!
//! A [`MediaReference`] is the only way a user-supplied URL enters the rest of
//! this crate. Parsing checks the platform shape (host allow-list plus an
//! extractable video id) without any network or subprocess activity, so
//! garbage input is rejected for free.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::Url;

/// Hosts accepted for full youtube.com-style URLs
const ALLOWED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// Video id alphabet. Length is not enforced here; whether an id actually
/// exists is the collaborator's call.
static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("video id regex"));

/// A user-supplied URL that passed the YouTube shape check
///
/// Constructed per request and discarded after use. The original URL text is
/// kept verbatim so the collaborator sees exactly what the user pasted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    url: String,
    video_id: String,
}

impl MediaReference {
    /// Validate `input` against the YouTube URL shape.
    ///
    /// Accepts `watch?v=`, `youtu.be/`, `/shorts/`, `/embed/`, `/v/` and
    /// `/live/` forms, with or without a scheme. Returns
    /// [`Error::InvalidReference`] for anything else.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_reference("empty URL"));
        }

        // Browsers and users routinely omit the scheme.
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let parsed = Url::parse(&candidate)
            .map_err(|e| Error::invalid_reference(format!("{trimmed}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::invalid_reference(format!(
                    "unsupported scheme: {other}"
                )));
            }
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::invalid_reference("missing host"))?
            .to_ascii_lowercase();

        let video_id = if host == "youtu.be" {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next())
                .map(str::to_owned)
        } else if ALLOWED_HOSTS.contains(&host.as_str()) {
            let mut segments = parsed.path_segments().into_iter().flatten();
            match segments.next() {
                Some("watch") => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("shorts") | Some("embed") | Some("v") | Some("live") => {
                    segments.next().map(str::to_owned)
                }
                _ => None,
            }
        } else {
            return Err(Error::invalid_reference(format!(
                "unsupported host: {host}"
            )));
        };

        let video_id =
            video_id.ok_or_else(|| Error::invalid_reference("no video id in URL"))?;
        if !VIDEO_ID_RE.is_match(&video_id) {
            return Err(Error::invalid_reference(format!(
                "malformed video id: {video_id}"
            )));
        }

        Ok(Self {
            url: trimmed.to_string(),
            video_id,
        })
    }

    /// The URL exactly as supplied (trimmed)
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The extracted video id
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Canonical `watch?v=` form of this reference
    pub fn canonical_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
