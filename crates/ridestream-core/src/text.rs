//! Log-friendly previews of untrusted payload text.

/// Longest prefix of `s` that fits in `max_bytes` without splitting a char.
pub fn floor_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Single-line preview of a payload for diagnostics.
///
/// Line breaks become spaces so a multi-line SSE body stays on one log line,
/// and anything past `max_bytes` is cut at a char boundary and marked with
/// `...`.
pub fn preview(s: &str, max_bytes: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.len() <= max_bytes {
        return flat;
    }
    format!("{}...", floor_to_char_boundary(&flat, max_bytes))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
