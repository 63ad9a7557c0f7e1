//! Whitespace and line-ending normalization.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static TRAILING_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("valid trailing whitespace pattern"));

#[allow(clippy::expect_used)]
static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"));

#[allow(clippy::expect_used)]
static INLINE_SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid inline space pattern"));

/// Normalizes contract text so every stage sees the same layout.
///
/// Line endings become `\n`, non-breaking spaces become plain spaces, a
/// leading byte-order mark is dropped, trailing whitespace is stripped from
/// every line, runs of spaces collapse to one, and paragraphs are separated by
/// exactly one blank line.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let text = raw
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{00a0}', " ");

    let text = TRAILING_WHITESPACE.replace_all(&text, "");
    let text = INLINE_SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_LINE_RUNS.replace_all(&text, "\n\n");

    text.trim().to_string()
}
