// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Output mode and terminal styling shared by all subcommands.
//!
//! `main` builds one [`OutputMode`] from the global flags and hands it to
//! each command.

use serde::Serialize;

const NO_COLOR_VAR: &str = "NO_COLOR";

fn flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.is_empty() && v != "0")
}

/// How a command reports to the terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputMode {
    /// Machine-readable output on stdout.
    pub json: bool,
    /// Non-essential output suppressed.
    pub quiet: bool,
}

impl OutputMode {
    pub fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    pub fn is_json(self) -> bool {
        self.json
    }

    pub fn is_quiet(self) -> bool {
        self.quiet
    }

    /// Whether a live progress bar should be drawn.
    pub fn shows_progress(self) -> bool {
        !self.json && !self.quiet
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  failed to encode JSON output: {e}"),
    }
}

/// Status symbols, colored unless `NO_COLOR` is set.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self {
            color: !flag(NO_COLOR_VAR),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn ok_sym(&self) -> String {
        self.paint("32", "✓")
    }

    pub fn fail_sym(&self) -> String {
        self.paint("31", "✗")
    }

    pub fn warn_sym(&self) -> String {
        self.paint("33", "!")
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}
