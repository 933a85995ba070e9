//! Format selector strings and kind-specific tool arguments.

use std::path::Path;
use std::time::Duration;

use super::{Container, MediaFormat, MediaKind};
use crate::tools;

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Split-stream tiers, best first: 8K, 4K, 1080p, then any pair, then any single stream.
const MERGE_VIDEO_SELECTOR: &str = "bv*[height>=4320][ext=mp4]+ba[ext=m4a]/\
bv*[height>=2160][ext=mp4]+ba[ext=m4a]/\
bv*[height>=1080][ext=mp4]+ba[ext=m4a]/\
bv*+ba/b";

const PROGRESSIVE_MP4_SELECTOR: &str = "b[ext=mp4][height>=720]/b[ext=mp4]/b";
const PROGRESSIVE_ANY_SELECTOR: &str = "b[height>=720]/b";
const AUDIO_SELECTOR: &str = "bestaudio/best";

/// Which streams the media tool may select, decided per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPolicy {
    /// A merge tool is installed: separate video+audio streams can be combined.
    MergeCapable,
    /// No merge tool: only progressive (already combined) streams.
    ProgressiveOnly,
}

/// True if `merge_tool -version` runs and exits 0 within the timeout.
/// Blocking; call from `spawn_blocking` in async code.
pub fn merge_tool_available(merge_tool: &Path) -> bool {
    tools::version_check(merge_tool, "-version", VERSION_CHECK_TIMEOUT)
}

impl FormatPolicy {
    /// Probe the merge tool. Blocking; re-run at the start of every batch
    /// since tools can be installed or removed between runs.
    pub fn detect(merge_tool: &Path) -> Self {
        Self::from_availability(merge_tool_available(merge_tool))
    }

    pub fn from_availability(merge_tool_present: bool) -> Self {
        if merge_tool_present {
            FormatPolicy::MergeCapable
        } else {
            FormatPolicy::ProgressiveOnly
        }
    }

    /// The `-f` selector string for `format`.
    pub fn selector(self, format: &MediaFormat) -> &'static str {
        match (format.kind(), self) {
            (MediaKind::Audio, _) => AUDIO_SELECTOR,
            (MediaKind::Video, FormatPolicy::MergeCapable) => MERGE_VIDEO_SELECTOR,
            (MediaKind::Video, FormatPolicy::ProgressiveOnly) => {
                if format.container == Container::Mp4 {
                    PROGRESSIVE_MP4_SELECTOR
                } else {
                    PROGRESSIVE_ANY_SELECTOR
                }
            }
        }
    }

    /// Post-processing and embedding arguments for `format`.
    pub fn format_args(self, format: &MediaFormat) -> Vec<String> {
        let container = format.container.as_str();
        let mut args: Vec<String> = Vec::new();
        match format.kind() {
            MediaKind::Video => {
                args.extend(["--embed-thumbnail", "--embed-metadata"].map(String::from));
                match self {
                    FormatPolicy::MergeCapable => {
                        args.extend(
                            [
                                "--merge-output-format",
                                container,
                                "--format-sort",
                                "res,fps,br",
                            ]
                            .map(String::from),
                        );
                    }
                    FormatPolicy::ProgressiveOnly => {
                        if format.container == Container::Mkv {
                            args.extend(["--remux-video", "mkv"].map(String::from));
                        }
                    }
                }
            }
            MediaKind::Audio => {
                args.extend(
                    [
                        "-x",
                        "--audio-format",
                        container,
                        "--audio-quality",
                        "0",
                        "--add-metadata",
                    ]
                    .map(String::from),
                );
                if format.supports_embedded_artwork() {
                    args.extend(
                        [
                            "--embed-thumbnail",
                            "--parse-metadata",
                            "%(channel,uploader)s:%(meta_artist)s",
                            "--parse-metadata",
                            "%(title)s:%(meta_title)s",
                            "--parse-metadata",
                            "%(upload_date>%Y)s:%(meta_date)s",
                            "--replace-in-metadata",
                            "artist",
                            "^@",
                            "",
                        ]
                        .map(String::from),
                    );
                }
            }
        }
        args
    }
}
