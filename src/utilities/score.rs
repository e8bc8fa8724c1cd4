//! Best-effort score extraction from free-text evaluations.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches "85/100", "85点", "85 分" and similar: up to three digits
/// followed by a slash or a CJK point/mark suffix.
static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,3})\s*[/点分]").unwrap());

/// Extract a numeric score from evaluation text.
///
/// Takes the first pattern match and returns it as a float. This is an
/// advisory, analytics-only extraction: text with no recognizable score
/// yields `None`, never zero and never an error.
pub fn parse_score(text: &str) -> Option<f64> {
    let captures = SCORE_RE.captures(text)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}
