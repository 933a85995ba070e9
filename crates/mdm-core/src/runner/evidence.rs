//! Deciding whether an attempt produced a file.
//!
//! The tool's exit code is not trusted on its own: it exits non-zero when
//! post-processing (thumbnail embedding, metadata) fails after the media
//! was already written, and it can exit zero having written nothing useful.
//! The checks below run in order and the first match decides. This is a
//! heuristic, not a guarantee.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Extensions of files the tool is still writing.
const IN_PROGRESS_EXTENSIONS: [&str; 3] = ["part", "ytdl", "temp"];

/// File names present in a directory at one instant.
#[derive(Debug, Clone, Default)]
pub struct DirSnapshot {
    names: HashSet<OsString>,
}

impl DirSnapshot {
    /// Lists `dir`. A missing or unreadable directory counts as empty.
    pub fn capture(dir: &Path) -> Self {
        let names = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name())
                .collect(),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), "cannot list output dir: {}", e);
                HashSet::new()
            }
        };
        Self { names }
    }

    /// Names in `later` that were not in `self`, sorted.
    pub fn added<'a>(&self, later: &'a DirSnapshot) -> Vec<&'a OsString> {
        let mut added: Vec<&'a OsString> = later
            .names
            .iter()
            .filter(|name| !self.names.contains(*name))
            .collect();
        added.sort();
        added
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Why an attempt was judged successful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// A new file with a recognized media extension appeared.
    NewArtifact(PathBuf),
    /// The path the tool announced exists (possibly with another extension).
    AnnouncedDestination(PathBuf),
    /// Nothing on disk, but the tool exited 0.
    ExitSuccess,
}

/// Inputs to the evidence checks.
pub struct EvidenceInput<'a> {
    pub output_dir: &'a Path,
    pub before: &'a DirSnapshot,
    pub after: &'a DirSnapshot,
    pub destination: Option<&'a str>,
    pub exit_success: bool,
    /// Lowercase extensions without the dot.
    pub extensions: &'a [&'a str],
}

type Check = fn(&EvidenceInput<'_>) -> Option<Evidence>;

const CHECKS: [Check; 3] = [new_artifact, announced_destination, exit_success];

/// First matching check, or `None` when the attempt failed.
pub fn judge(input: &EvidenceInput<'_>) -> Option<Evidence> {
    CHECKS.iter().find_map(|check| check(input))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Matches the per-stream files written before a merge, `Title.f137.mp4`.
fn stream_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.f\d+\.[^.]+$").expect("stream suffix pattern is valid"))
}

/// Unmerged format streams and partial downloads are not finished media.
fn is_intermediate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if stream_suffix_pattern().is_match(name) {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IN_PROGRESS_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_artifact(path: &Path, extensions: &[&str]) -> bool {
    has_extension(path, extensions) && !is_intermediate(path)
}

fn new_artifact(input: &EvidenceInput<'_>) -> Option<Evidence> {
    input
        .before
        .added(input.after)
        .into_iter()
        .map(|name| input.output_dir.join(name))
        .find(|p| is_artifact(p, input.extensions))
        .map(Evidence::NewArtifact)
}

fn resolve_destination(output_dir: &Path, announced: &str) -> PathBuf {
    let expanded = match announced.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(announced)),
        None => PathBuf::from(announced),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        output_dir.join(expanded)
    }
}

fn announced_destination(input: &EvidenceInput<'_>) -> Option<Evidence> {
    let mut dest = resolve_destination(input.output_dir, input.destination?);
    if dest.is_file() && is_artifact(&dest, input.extensions) {
        return Some(Evidence::AnnouncedDestination(dest));
    }
    // A stream announcement names the merged file once the suffix is dropped;
    // the placeholder extension is swapped below.
    if let Some(name) = dest.file_name().and_then(|n| n.to_str()) {
        let merged = stream_suffix_pattern().replace(name, ".mp4").into_owned();
        if merged != name {
            dest.set_file_name(merged);
        }
    }
    // Post-processing usually changes the extension (webm -> mp3).
    input
        .extensions
        .iter()
        .map(|ext| dest.with_extension(ext))
        .find(|candidate| candidate.is_file() && !is_intermediate(candidate))
        .map(Evidence::AnnouncedDestination)
}

fn exit_success(input: &EvidenceInput<'_>) -> Option<Evidence> {
    input.exit_success.then_some(Evidence::ExitSuccess)
}
