//! Bitrate strings reported by the audio tool
//!
//! `sox --i -B` prints values such as `128k` or `1.41M`.

/// Parse a reported bitrate into bits/sec
///
/// A trailing `k`/`K` multiplies by one thousand and `M` by one million.
/// Returns `None` for empty or malformed input.
pub fn parse_bitrate(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.char_indices().last()? {
        (i, 'k') | (i, 'K') => (&raw[..i], 1_000.0),
        (i, 'M') => (&raw[..i], 1_000_000.0),
        _ => (raw, 1.0),
    };

    let value: f64 = digits.trim().parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    Some((value * multiplier).round() as u64)
}

/// Rewrite a reported bitrate with its unit expanded, e.g. `"128k"` → `"128000"`
pub fn normalize_bitrate(raw: &str) -> Option<String> {
    parse_bitrate(raw).map(|bits| bits.to_string())
}
