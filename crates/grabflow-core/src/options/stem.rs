//! Output-name stem: a filesystem-safe slug of the discovered title.

use deunicode::deunicode;

/// Default bound on stem length, in characters.
pub const DEFAULT_STEM_MAX_LEN: usize = 100;

/// Stem used when the title slugs down to nothing.
pub const FALLBACK_STEM: &str = "download";

/// Derives the shared stem for every artifact of one workflow pass.
///
/// - Transliterates to ASCII ("Café" becomes "cafe")
/// - Lowercases and keeps alphanumerics
/// - Drops apostrophes so "don't" becomes "dont"
/// - Collapses every other run of characters into a single `-`
/// - Trims leading/trailing `-` and limits length to `max_len` characters
pub fn derive_stem(title: &str, max_len: usize) -> String {
    let ascii = deunicode(title);
    let mut out = String::with_capacity(ascii.len());
    let mut prev_dash = true;

    for c in ascii.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }

    let truncated: String = out.chars().take(max_len).collect();
    let trimmed = truncated.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}
