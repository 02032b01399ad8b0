// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Text extraction from rendered pages.
//!
//! Three steps, each usable on its own:
//! 1. [`readiness`] decides when the script-rendered body has arrived.
//! 2. [`selector`] picks the region that holds the document.
//! 3. [`sanitize`] normalizes the captured text.
//!
//! [`indicators`] holds the keyword vocabularies both detectors share.

pub mod indicators;
pub mod readiness;
pub mod sanitize;
pub mod selector;

pub use indicators::{IndicatorReport, Vocabulary};
pub use readiness::{Readiness, ReadinessConfig, ReadinessDetector, ReadinessState};
pub use sanitize::sanitize;
pub use selector::{ContentCandidate, ContentSelector, Selection};
