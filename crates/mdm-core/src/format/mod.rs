//! Output formats and the format-selection policy.
//!
//! A batch targets one `MediaFormat` (video or audio container). Which
//! streams the media tool should pick depends on whether a merge tool is
//! installed: with one, separate best video and audio streams are combined
//! at the highest resolution tier available; without one, only already
//! combined (progressive) streams can be used.

mod policy;

pub use policy::{merge_tool_available, FormatPolicy};

use std::fmt;
use std::str::FromStr;

/// Whether a batch downloads video or extracts audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// File extensions that count as a finished artifact of this kind.
    pub fn artifact_extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => &["mp4", "mkv", "webm", "mov", "m4v"],
            MediaKind::Audio => &["mp3", "wav", "m4a", "opus", "ogg", "flac"],
        }
    }
}

/// Target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Mkv,
    Webm,
    Mp3,
    M4a,
    Flac,
    Opus,
    Wav,
}

impl Container {
    pub fn as_str(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "mkv",
            Container::Webm => "webm",
            Container::Mp3 => "mp3",
            Container::M4a => "m4a",
            Container::Flac => "flac",
            Container::Opus => "opus",
            Container::Wav => "wav",
        }
    }

    pub fn kind(self) -> MediaKind {
        match self {
            Container::Mp4 | Container::Mkv | Container::Webm => MediaKind::Video,
            Container::Mp3 | Container::M4a | Container::Flac | Container::Opus | Container::Wav => {
                MediaKind::Audio
            }
        }
    }
}

/// Error for an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported format '{0}' (video: mp4, mkv, webm; audio: mp3, m4a, flac, opus, wav)")]
pub struct UnknownFormat(pub String);

/// The output format of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFormat {
    pub container: Container,
}

impl MediaFormat {
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    pub fn kind(&self) -> MediaKind {
        self.container.kind()
    }

    /// WAV has no tag slot for cover art; thumbnails would be left as sidecars.
    pub fn supports_embedded_artwork(&self) -> bool {
        self.container != Container::Wav
    }
}

impl FromStr for MediaFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let container = match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Container::Mp4,
            "mkv" => Container::Mkv,
            "webm" => Container::Webm,
            "mp3" => Container::Mp3,
            "m4a" => Container::M4a,
            "flac" => Container::Flac,
            "opus" => Container::Opus,
            "wav" => Container::Wav,
            _ => return Err(UnknownFormat(s.to_string())),
        };
        Ok(Self { container })
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.container.as_str())
    }
}
