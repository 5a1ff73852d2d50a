//! Human-readable approximate sizes for discovered formats.
//!
//! Sizes shown to the user are deliberately approximate: when jitter is on the
//! byte count is scaled by a random factor in [0.9, 1.1] before formatting, so
//! the same format may render differently between discoveries. Sorting parses
//! the rendered label back instead of keeping the byte count around.

use rand::Rng;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

const JITTER_MIN: f64 = 0.9;
const JITTER_MAX: f64 = 1.1;

/// Label used when neither an exact nor an estimated size is known.
pub const UNKNOWN_SIZE: &str = "N/A";

/// Formats a byte count as B/KB/MB/GB (binary units) with one decimal.
pub fn format_size(bytes: f64) -> String {
    if bytes < KIB {
        format!("{:.1} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes / KIB)
    } else if bytes < GIB {
        format!("{:.1} MB", bytes / MIB)
    } else {
        format!("{:.1} GB", bytes / GIB)
    }
}

/// Random multiplicative factor in [0.9, 1.1].
pub fn jitter_factor() -> f64 {
    rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX)
}

/// Label for an optional byte count; zero and missing sizes render as `N/A`.
pub fn approximate_size(bytes: Option<f64>, jitter: bool) -> String {
    match bytes.filter(|b| *b > 0.0) {
        Some(b) if jitter => format_size(b * jitter_factor()),
        Some(b) => format_size(b),
        None => UNKNOWN_SIZE.to_string(),
    }
}

/// Parses a label produced by [`format_size`] back to kilobytes for ordering.
///
/// Only KB, MB and GB labels are understood; bytes, `N/A` and anything
/// malformed come back as zero.
pub fn size_to_kb(label: &str) -> f64 {
    let Some((value, unit)) = label.trim().split_once(' ') else {
        return 0.0;
    };
    let scale = match unit.trim() {
        "KB" => 1.0,
        "MB" => KIB,
        "GB" => KIB * KIB,
        _ => return 0.0,
    };
    value.trim().parse::<f64>().map(|v| v * scale).unwrap_or(0.0)
}
