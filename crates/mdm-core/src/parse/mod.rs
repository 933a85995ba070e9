//! Incremental parser for the media tool's line-oriented output.
//!
//! Each line is classified into a [`LineEvent`]; the events of one attempt
//! are folded into [`AttemptSignals`], which the runner uses to judge the
//! attempt and to build the error text when it fails.

mod percent;

pub use percent::{FirstPercentToken, PercentExtractor, DOWNLOAD_MARKER};

use std::collections::VecDeque;

/// Number of trailing output lines kept for error reports.
pub const ERROR_TAIL_LINES: usize = 10;

const DESTINATION_MARKER: &str = "Destination:";
const MERGER_MARKER: &str = "Merging formats into \"";
const ERROR_PREFIX: &str = "ERROR:";
const WARNING_PREFIX: &str = "WARNING:";

/// Lowercase phrases the site uses when it suspects automation.
const BOT_PHRASES: [&str; 2] = ["sign in to confirm", "not a bot"];

/// Lowercase substrings of errors raised after the media was already fetched.
const POST_PROCESSING_MARKERS: [&str; 6] = [
    "postprocessing",
    "post-processing",
    "thumbnail",
    "ffmpeg",
    "ffprobe",
    "conversion failed",
];

/// Message shown instead of the raw tool output when bot detection fired.
pub const BOT_DETECTED_MESSAGE: &str = "The site is asking to confirm this is not a bot. \
Sign in to the site in Chrome, Edge or Firefox so session cookies can be used, \
or supply a PO token (--po-token), then retry.";

/// Classification of one output line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    Progress(f64),
    Destination(String),
    BotDetected,
    /// `ERROR:` line about the download itself.
    HardError(String),
    /// `ERROR:` line from post-processing; does not fail the attempt alone.
    SoftError(String),
    Other,
}

/// Classifies `line` using `percent` for progress tokens.
///
/// Destination announcements come first so a title can never trip the
/// other markers. Bot phrases only count on `ERROR:`/`WARNING:` lines and
/// win over the generic error markers there.
pub fn classify_line(line: &str, percent: &dyn PercentExtractor) -> LineEvent {
    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Other;
    }
    if let Some(path) = parse_destination(line) {
        return LineEvent::Destination(path);
    }
    let lower = line.to_lowercase();
    let diagnostic = line.starts_with(ERROR_PREFIX) || line.starts_with(WARNING_PREFIX);
    if diagnostic && BOT_PHRASES.iter().any(|p| lower.contains(p)) {
        return LineEvent::BotDetected;
    }
    if line.starts_with(ERROR_PREFIX) {
        return if POST_PROCESSING_MARKERS.iter().any(|m| lower.contains(m)) {
            LineEvent::SoftError(line.to_string())
        } else {
            LineEvent::HardError(line.to_string())
        };
    }
    match percent.extract(line) {
        Some(p) => LineEvent::Progress(p),
        None => LineEvent::Other,
    }
}

/// Path announced by a `[stage] Destination:` line or the merger, quotes
/// stripped.
fn parse_destination(line: &str) -> Option<String> {
    if !line.starts_with('[') {
        return None;
    }
    let path = if let Some(idx) = line.find(DESTINATION_MARKER) {
        &line[idx + DESTINATION_MARKER.len()..]
    } else if let Some(idx) = line.find(MERGER_MARKER) {
        &line[idx + MERGER_MARKER.len()..]
    } else {
        return None;
    };
    let path = path.trim().trim_matches('"');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Everything learned from one attempt's output.
#[derive(Debug, Clone, Default)]
pub struct AttemptSignals {
    pub bot_detected: bool,
    pub download_error: bool,
    pub soft_error: bool,
    /// Last announced output path.
    pub destination: Option<String>,
    pub last_error: Option<String>,
    pub last_progress: Option<f64>,
    tail: VecDeque<String>,
}

impl AttemptSignals {
    /// Last non-empty output lines, oldest first.
    pub fn tail(&self) -> impl Iterator<Item = &str> {
        self.tail.iter().map(String::as_str)
    }

    /// Text describing why the attempt failed, from what the tool printed.
    pub fn error_text(&self) -> String {
        if self.bot_detected {
            return BOT_DETECTED_MESSAGE.to_string();
        }
        if let Some(err) = &self.last_error {
            return err.clone();
        }
        if self.tail.is_empty() {
            "Unknown error".to_string()
        } else {
            self.tail().collect::<Vec<_>>().join("\n")
        }
    }
}

/// Stateful line consumer for one attempt.
pub struct OutputParser {
    percent: Box<dyn PercentExtractor>,
    signals: AttemptSignals,
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new(Box::new(FirstPercentToken))
    }
}

impl OutputParser {
    pub fn new(percent: Box<dyn PercentExtractor>) -> Self {
        Self {
            percent,
            signals: AttemptSignals::default(),
        }
    }

    /// Consumes one line; returns the new progress value if the line had one.
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            if self.signals.tail.len() == ERROR_TAIL_LINES {
                self.signals.tail.pop_front();
            }
            self.signals.tail.push_back(trimmed.to_string());
        }

        match classify_line(trimmed, self.percent.as_ref()) {
            LineEvent::Progress(p) => {
                self.signals.last_progress = Some(p);
                return Some(p);
            }
            LineEvent::Destination(path) => self.signals.destination = Some(path),
            LineEvent::BotDetected => {
                self.signals.bot_detected = true;
                self.signals.download_error = true;
                self.signals.last_error = Some(trimmed.to_string());
            }
            LineEvent::HardError(msg) => {
                self.signals.download_error = true;
                self.signals.last_error = Some(msg);
            }
            LineEvent::SoftError(_) => self.signals.soft_error = true,
            LineEvent::Other => {}
        }
        None
    }

    pub fn signals(&self) -> &AttemptSignals {
        &self.signals
    }

    pub fn finish(self) -> AttemptSignals {
        self.signals
    }
}
