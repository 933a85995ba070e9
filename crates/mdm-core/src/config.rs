use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Attempt pacing (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Fixed pause between two attempts of the same URL, in seconds.
    pub backoff_secs: f64,
    /// Hard ceiling for one external tool run, in seconds.
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_secs: 2.0,
            attempt_timeout_secs: 30 * 60,
        }
    }
}

/// Browser cookie probe parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Per-browser probe timeout in seconds.
    pub timeout_secs: u64,
    /// How long a probe result (including "no browser") stays valid.
    pub cache_secs: u64,
    /// Known-good public resource fetched during the probe.
    pub reference_url: String,
    /// Identifier the tool must print for the probe to count as a success.
    pub reference_id: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            cache_secs: 5 * 60,
            reference_url: "https://www.youtube.com/watch?v=jNQXAC9IVRw".to_string(),
            reference_id: "jNQXAC9IVRw".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/mdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdmConfig {
    /// External media tool (yt-dlp compatible command line).
    pub downloader_path: String,
    /// Merge/post-process tool; its presence switches the format policy.
    pub merge_tool_path: String,
    /// Cache directory handed to the media tool (None = `$TMPDIR/yt-dlp-cache`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Failed-download journal location (None = XDG state dir).
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
    /// Probe installed browsers for usable session cookies before each batch.
    #[serde(default = "default_true")]
    pub detect_browser_cookies: bool,
    /// Bot-bypass (PO) token appended to every strategy when set.
    #[serde(default)]
    pub bot_bypass_token: Option<String>,
    /// Optional attempt pacing; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional browser probe tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub probe: Option<ProbeConfig>,
}

fn default_true() -> bool {
    true
}

impl Default for MdmConfig {
    fn default() -> Self {
        Self {
            downloader_path: "yt-dlp".to_string(),
            merge_tool_path: "ffmpeg".to_string(),
            cache_dir: None,
            journal_path: None,
            detect_browser_cookies: true,
            bot_bypass_token: None,
            retry: None,
            probe: None,
        }
    }
}

impl MdmConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn probe_or_default(&self) -> ProbeConfig {
        self.probe.clone().unwrap_or_default()
    }

    /// Cache directory for the media tool, falling back to the system temp dir.
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("yt-dlp-cache"))
    }

    pub fn backoff(&self) -> Duration {
        let secs = self.retry_or_default().backoff_secs;
        if secs.is_finite() {
            Duration::from_secs_f64(secs.clamp(0.0, 3600.0))
        } else {
            Duration::from_secs(2)
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.retry_or_default().attempt_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MdmConfig::default();
        assert_eq!(cfg.downloader_path, "yt-dlp");
        assert_eq!(cfg.merge_tool_path, "ffmpeg");
        assert!(cfg.detect_browser_cookies);
        assert_eq!(cfg.backoff(), Duration::from_secs(2));
        assert_eq!(cfg.attempt_timeout(), Duration::from_secs(1800));
        assert_eq!(cfg.probe_or_default().timeout_secs, 5);
        assert_eq!(cfg.probe_or_default().cache_secs, 300);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MdmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MdmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.downloader_path, cfg.downloader_path);
        assert_eq!(parsed.merge_tool_path, cfg.merge_tool_path);
        assert_eq!(parsed.detect_browser_cookies, cfg.detect_browser_cookies);
    }

    #[test]
    fn config_toml_minimal_uses_defaults() {
        let toml = r#"
            downloader_path = "/opt/bin/yt-dlp"
            merge_tool_path = "/usr/bin/ffmpeg"
        "#;
        let cfg: MdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.downloader_path, "/opt/bin/yt-dlp");
        assert!(cfg.detect_browser_cookies);
        assert!(cfg.retry.is_none());
        assert!(cfg.bot_bypass_token.is_none());
        assert_eq!(cfg.backoff(), Duration::from_secs(2));
    }

    #[test]
    fn config_toml_retry_and_probe_sections() {
        let toml = r#"
            downloader_path = "yt-dlp"
            merge_tool_path = "ffmpeg"
            detect_browser_cookies = false
            bot_bypass_token = "web.gvs+abc"
            journal_path = "/tmp/failed.csv"

            [retry]
            backoff_secs = 0.5
            attempt_timeout_secs = 60

            [probe]
            timeout_secs = 3
            cache_secs = 10
            reference_url = "https://example.com/watch?v=abc"
            reference_id = "abc"
        "#;
        let cfg: MdmConfig = toml::from_str(toml).unwrap();
        assert!(!cfg.detect_browser_cookies);
        assert_eq!(cfg.bot_bypass_token.as_deref(), Some("web.gvs+abc"));
        assert_eq!(cfg.backoff(), Duration::from_millis(500));
        assert_eq!(cfg.attempt_timeout(), Duration::from_secs(60));
        let probe = cfg.probe_or_default();
        assert_eq!(probe.timeout_secs, 3);
        assert_eq!(probe.reference_id, "abc");
        assert_eq!(
            cfg.journal_path.as_deref(),
            Some(std::path::Path::new("/tmp/failed.csv"))
        );
    }
}
