//! Authentication and client-spoofing strategy escalation.
//!
//! Different argument combinations get past different failure modes
//! (missing session, bot detection, regional blocks), so every attempt of a
//! URL uses a more aggressive bundle than the one before. Cookie-based rows
//! depend on which installed browser holds a usable session; finding that
//! out means running the media tool once per browser, so the answer is
//! cached for a short window and shared by every batch in the process.

mod browser;
mod strategy;

pub use browser::{BrowserId, BrowserProbe, DetectedBrowser, ToolCookieProbe};
pub use strategy::{build_strategy, AuthStrategy};

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::MdmConfig;

/// How long a browser probe result stays valid.
pub const DEFAULT_DETECTION_VALIDITY: Duration = Duration::from_secs(5 * 60);
/// Per-browser probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct AuthState {
    detected: Option<DetectedBrowser>,
    bot_bypass_token: Option<String>,
}

/// Process-wide strategy service. Share it as `Arc<AuthStrategyProvider>`.
pub struct AuthStrategyProvider {
    probe: Arc<dyn BrowserProbe>,
    candidates: Vec<BrowserId>,
    validity: Duration,
    probe_timeout: Duration,
    state: Mutex<AuthState>,
    /// Held for the whole probe sequence so at most one runs at a time.
    probe_guard: tokio::sync::Mutex<()>,
    probe_runs: AtomicUsize,
}

impl AuthStrategyProvider {
    pub fn new(probe: Arc<dyn BrowserProbe>) -> Self {
        Self {
            probe,
            candidates: BrowserId::PRIORITY.to_vec(),
            validity: DEFAULT_DETECTION_VALIDITY,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            state: Mutex::new(AuthState::default()),
            probe_guard: tokio::sync::Mutex::new(()),
            probe_runs: AtomicUsize::new(0),
        }
    }

    /// Provider that probes through the configured media tool.
    pub fn from_config(cfg: &MdmConfig) -> Self {
        let probe_cfg = cfg.probe_or_default();
        let probe = ToolCookieProbe {
            program: PathBuf::from(&cfg.downloader_path),
            reference_url: probe_cfg.reference_url,
            reference_id: probe_cfg.reference_id,
        };
        let provider = Self::new(Arc::new(probe))
            .with_validity(Duration::from_secs(probe_cfg.cache_secs))
            .with_probe_timeout(Duration::from_secs(probe_cfg.timeout_secs.max(1)));
        if let Some(token) = cfg.bot_bypass_token.as_deref().filter(|t| !t.is_empty()) {
            provider.set_bot_bypass_token(token);
        }
        provider
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<BrowserId>) -> Self {
        self.candidates = candidates;
        self
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last probe result, fresh or not.
    pub fn cached_detection(&self) -> Option<DetectedBrowser> {
        self.lock_state().detected
    }

    /// Browser from the last probe, without checking freshness.
    pub fn cached_browser(&self) -> Option<BrowserId> {
        self.cached_detection().and_then(|d| d.browser)
    }

    /// Number of probe sequences that actually ran.
    pub fn probe_runs(&self) -> usize {
        self.probe_runs.load(Ordering::Relaxed)
    }

    fn fresh_detection(&self) -> Option<DetectedBrowser> {
        self.cached_detection()
            .filter(|d| d.is_fresh(self.validity))
    }

    /// Finds the first browser with usable session cookies.
    ///
    /// The result (including "none") is cached for the validity window and
    /// reused unless `force_refresh` is set. Concurrent callers never start
    /// a second probe sequence: they wait for the running one and take its
    /// result.
    pub async fn detect_browser(&self, force_refresh: bool) -> Option<BrowserId> {
        let requested_at = Instant::now();
        if !force_refresh {
            if let Some(d) = self.fresh_detection() {
                tracing::debug!(browser = ?d.browser, "using cached browser detection");
                return d.browser;
            }
        }

        let _probe = self.probe_guard.lock().await;

        // A probe that finished while we waited may already answer this call.
        if let Some(d) = self.cached_detection() {
            let satisfies = if force_refresh {
                d.detected_at >= requested_at
            } else {
                d.is_fresh(self.validity)
            };
            if satisfies {
                return d.browser;
            }
        }

        tracing::info!("detecting available browser cookies...");
        let probe = Arc::clone(&self.probe);
        let candidates = self.candidates.clone();
        let timeout = self.probe_timeout;
        let found = tokio::task::spawn_blocking(move || {
            browser::probe_candidates(probe.as_ref(), &candidates, timeout)
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("browser probe task failed: {}", e);
            None
        });
        self.probe_runs.fetch_add(1, Ordering::Relaxed);

        match found {
            Some(b) => tracing::info!("browser cookies available: {}", b.as_str()),
            None => tracing::warn!("no browser cookies available; downloads may fail"),
        }

        self.lock_state().detected = Some(DetectedBrowser {
            browser: found,
            detected_at: Instant::now(),
        });
        found
    }

    /// Strategy for attempt `attempt` (1-based). Never probes.
    pub fn build_args(&self, attempt: u32) -> AuthStrategy {
        let state = self.lock_state();
        let browser = state.detected.and_then(|d| d.browser);
        build_strategy(attempt, browser, state.bot_bypass_token.as_deref())
    }

    /// Stores a bot-bypass token for all future strategies.
    pub fn set_bot_bypass_token(&self, token: impl Into<String>) {
        self.lock_state().bot_bypass_token = Some(token.into());
        tracing::info!("bot-bypass token set");
    }

    pub fn clear_bot_bypass_token(&self) {
        self.lock_state().bot_bypass_token = None;
    }

    pub fn bot_bypass_token(&self) -> Option<String> {
        self.lock_state().bot_bypass_token.clone()
    }

    /// Human-readable status of the cookie source.
    pub fn user_message(&self) -> String {
        match self.cached_browser() {
            Some(b) => format!("Using {} cookies for authentication", b.display_name()),
            None => "No browser cookies found. For reliable downloads, sign in to the site \
                     in Chrome, Edge or Firefox and retry; the session is then picked up \
                     automatically."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
