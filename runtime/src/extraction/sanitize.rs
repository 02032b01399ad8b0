// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Whitespace and control-character cleanup for captured text.

use regex::Regex;
use std::sync::LazyLock;

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\u{9F}]").expect("control regex is valid")
});
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run regex is valid"));
static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("space-run regex is valid"));

/// Normalize captured text.
///
/// Strips control characters (tab, newline and carriage return survive),
/// normalizes line endings, collapses three or more newlines to exactly two,
/// collapses space runs to one space, and trims the ends.
pub fn sanitize(text: &str) -> String {
    let text = CONTROL_CHARS.replace_all(text, "");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}
