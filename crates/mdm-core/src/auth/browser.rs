//! Browser identifiers, cached detection results, and the cookie probe.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use crate::tools;

/// Browsers whose cookie stores the media tool can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserId {
    Chrome,
    Edge,
    Brave,
    Chromium,
    Opera,
    Vivaldi,
    Firefox,
}

impl BrowserId {
    /// Probe order: chromium family first, then the rest.
    pub const PRIORITY: [BrowserId; 7] = [
        BrowserId::Chrome,
        BrowserId::Edge,
        BrowserId::Brave,
        BrowserId::Chromium,
        BrowserId::Opera,
        BrowserId::Vivaldi,
        BrowserId::Firefox,
    ];

    /// Name accepted by `--cookies-from-browser`.
    pub fn as_str(self) -> &'static str {
        match self {
            BrowserId::Chrome => "chrome",
            BrowserId::Edge => "edge",
            BrowserId::Brave => "brave",
            BrowserId::Chromium => "chromium",
            BrowserId::Opera => "opera",
            BrowserId::Vivaldi => "vivaldi",
            BrowserId::Firefox => "firefox",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BrowserId::Chrome => "Chrome",
            BrowserId::Edge => "Edge",
            BrowserId::Brave => "Brave",
            BrowserId::Chromium => "Chromium",
            BrowserId::Opera => "Opera",
            BrowserId::Vivaldi => "Vivaldi",
            BrowserId::Firefox => "Firefox",
        }
    }
}

/// Outcome of one probe sequence, "no browser" included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedBrowser {
    pub browser: Option<BrowserId>,
    pub detected_at: Instant,
}

impl DetectedBrowser {
    pub fn is_fresh(&self, validity: Duration) -> bool {
        self.detected_at.elapsed() < validity
    }
}

/// Checks whether one browser's stored session lets the tool fetch the
/// reference resource. Blocking; called from the blocking pool.
pub trait BrowserProbe: Send + Sync {
    fn probe(&self, browser: BrowserId, timeout: Duration) -> bool;
}

/// Probe that asks the media tool to print the id of a known public video
/// using the browser's cookies.
#[derive(Debug, Clone)]
pub struct ToolCookieProbe {
    pub program: PathBuf,
    pub reference_url: String,
    pub reference_id: String,
}

impl BrowserProbe for ToolCookieProbe {
    fn probe(&self, browser: BrowserId, timeout: Duration) -> bool {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--cookies-from-browser",
            browser.as_str(),
            "--print",
            "%(id)s",
            "--skip-download",
            "--no-warnings",
            "--quiet",
            self.reference_url.as_str(),
        ]);
        match tools::run_with_timeout(&mut cmd, timeout) {
            Ok(Some(output)) => {
                output.status.success()
                    && String::from_utf8_lossy(&output.stdout).contains(&self.reference_id)
            }
            Ok(None) => {
                tracing::debug!(browser = browser.as_str(), "cookie probe timed out");
                false
            }
            Err(e) => {
                tracing::debug!(browser = browser.as_str(), "cookie probe failed: {}", e);
                false
            }
        }
    }
}

/// Runs the probe over `candidates` in order; first success wins.
pub(super) fn probe_candidates(
    probe: &dyn BrowserProbe,
    candidates: &[BrowserId],
    timeout: Duration,
) -> Option<BrowserId> {
    candidates
        .iter()
        .copied()
        .find(|&browser| probe.probe(browser, timeout))
}
