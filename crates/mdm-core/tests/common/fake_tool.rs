//! Scripted stand-ins for the media tool and the merge tool.
//!
//! The fake media tool decides what to do from the URL (always its last
//! argument) and writes its output file into the working directory, which
//! the runner sets to the output directory:
//!
//! - `*fail*`: hard error, exit 1
//! - `*bot*`: bot-detection error, exit 1
//! - `*partial*`: writes the file, then a post-processing error, exit 1
//! - `*flaky*`: fails until the 10th call for that output directory
//! - `*slow*`: sleeps one second, then succeeds
//! - anything else: succeeds
//!
//! Every call appends its `-f` selector to `.selectors` in the output dir.
//! `--list-formats` prints a small format table (or fails for `*fail*`).

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use mdm_core::config::{MdmConfig, RetryConfig};

const MEDIA_TOOL: &str = r#"#!/bin/sh
for last in "$@"; do :; done
url="$last"
name="${url##*=}"
ext=mp4
prev=""
for a in "$@"; do
  case "$prev" in
    --audio-format|--merge-output-format) ext="$a" ;;
  esac
  prev="$a"
done
if [ "$1" = "--list-formats" ]; then
  case "$url" in
    *fail*)
      echo "ERROR: [generic] $name: Video unavailable" >&2
      exit 1 ;;
  esac
  echo "[info] Available formats for $name:"
  echo "ID  EXT  RESOLUTION"
  echo "18  mp4  640x360"
  echo "137 mp4  1920x1080"
  exit 0
fi
if [ "$1" = "-f" ]; then
  printf '%s\n' "$2" >> .selectors
fi
case "$url" in
  *fail*)
    echo "ERROR: [generic] $name: Video unavailable" >&2
    exit 1 ;;
  *bot*)
    echo "ERROR: [youtube] $name: Sign in to confirm you're not a bot. Use --cookies-from-browser" >&2
    exit 1 ;;
  *partial*)
    echo "[download] Destination: $name.webm"
    echo "[download] 100% of 1.00MiB"
    : > "$name.$ext"
    echo "ERROR: Postprocessing: Conversion failed!" >&2
    exit 1 ;;
  *flaky*)
    n=$(cat .attempts 2>/dev/null || echo 0)
    n=$((n + 1))
    echo "$n" > .attempts
    if [ "$n" -lt 10 ]; then
      echo "ERROR: unable to download video data: HTTP Error 403: Forbidden" >&2
      exit 1
    fi ;;
  *slow*)
    sleep 1 ;;
esac
echo "[download] Destination: $name.$ext"
echo "[download]  50.0% of 1.00MiB at 1.00MiB/s ETA 00:01"
echo "[download] 100% of 1.00MiB in 00:00:01"
: > "$name.$ext"
exit 0
"#;

const MERGE_TOOL: &str = r#"#!/bin/sh
echo "ffmpeg version 6.1"
exit 0
"#;

fn write_script(path: &Path, body: &str) -> PathBuf {
    fs::write(path, body).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
    path.to_path_buf()
}

/// Installs the fake media tool in `dir`.
pub fn install_media_tool(dir: &Path) -> PathBuf {
    write_script(&dir.join("fake-yt-dlp"), MEDIA_TOOL)
}

/// Installs a merge tool that answers `-version`.
pub fn install_merge_tool(dir: &Path) -> PathBuf {
    write_script(&dir.join("fake-ffmpeg"), MERGE_TOOL)
}

/// Path of a merge tool that does not exist.
pub fn missing_merge_tool(dir: &Path) -> PathBuf {
    dir.join("no-such-ffmpeg")
}

/// Config pointing at the fakes, with no backoff and no browser probing.
pub fn config(tools_dir: &Path, merge_tool: &Path) -> MdmConfig {
    MdmConfig {
        downloader_path: install_media_tool(tools_dir).to_string_lossy().into_owned(),
        merge_tool_path: merge_tool.to_string_lossy().into_owned(),
        cache_dir: Some(tools_dir.join("cache")),
        journal_path: Some(tools_dir.join("failed_downloads.csv")),
        detect_browser_cookies: false,
        bot_bypass_token: None,
        retry: Some(RetryConfig {
            backoff_secs: 0.0,
            attempt_timeout_secs: 30,
        }),
        probe: None,
    }
}

/// Selectors the fake tool was called with in `output_dir`.
pub fn selectors(output_dir: &Path) -> Vec<String> {
    fs::read_to_string(output_dir.join(".selectors"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
