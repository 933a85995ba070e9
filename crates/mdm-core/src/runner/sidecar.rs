//! Removal of stray thumbnail files for formats that cannot embed artwork.

use std::path::Path;

use super::evidence::DirSnapshot;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Deletes image files that appeared between `before` and `after`.
/// Returns how many were removed; failures are logged and skipped.
pub fn remove_image_sidecars(output_dir: &Path, before: &DirSnapshot, after: &DirSnapshot) -> usize {
    let mut removed = 0;
    for name in before.added(after) {
        let path = output_dir.join(name);
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed thumbnail sidecar");
                removed += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), "cannot remove sidecar: {}", e),
        }
    }
    removed
}
