//! Markdown stripping for speech synthesis.
//!
//! Generated replies often carry markdown that reads fine on screen but
//! sounds wrong when spoken ("asterisk asterisk hello"). This strips the
//! common patterns before text reaches a synthesis backend. The textual
//! reply returned to the client is never sanitized.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\*\*|__)(.*?)(\*\*|__)").expect("valid bold pattern"));

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\*|_)(.*?)(\*|_)").expect("valid emphasis pattern"));

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*#+\s*").expect("valid heading pattern"));

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[*\-]\s+").expect("valid list item pattern"));

/// Removes markdown emphasis, heading, and list markers from `text`.
///
/// Pure and idempotent: applying it twice yields the same result as once.
pub fn sanitize_for_speech(text: &str) -> String {
    let text = BOLD.replace_all(text, "${2}");
    let text = EMPHASIS.replace_all(&text, "${2}");
    let text = HEADING.replace_all(&text, "");
    let text = LIST_ITEM.replace_all(&text, "");
    text.into_owned()
}
