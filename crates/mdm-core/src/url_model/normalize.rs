//! Time-offset stripping (`t=90s` style parameters).

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn time_offset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([?&#])t=\d+[smh]?(&|#|$)").expect("time-offset pattern is valid")
    })
}

/// Removes time-offset parameters (`?t=90`, `&t=1m`, `#t=30s`) from a URL.
///
/// Separators are repaired so the remaining query stays well formed:
/// `?t=5&v=1` becomes `?v=1`, `?v=1&t=90s` becomes `?v=1`. Applying the
/// function to its own output returns it unchanged.
pub fn normalize_url(url: &str) -> String {
    let pattern = time_offset_pattern();
    let mut current = url.trim().to_string();
    // Adjacent offsets share a separator, so one pass can leave one behind.
    loop {
        let next = pattern
            .replace_all(&current, |caps: &Captures<'_>| {
                match (&caps[1], &caps[2]) {
                    ("?", "&") => "?".to_string(),
                    (_, tail) => tail.to_string(),
                }
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
