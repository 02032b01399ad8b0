// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Readiness detection for script-rendered pages.
//!
//! The portal first serves a shell (menus, accessibility bar, a "requires
//! javascript" notice) and fills in the document body later. The detector
//! polls the visible text until it looks like a finished document or the
//! poll budget runs out. It only reads from the session.

use super::indicators::{IndicatorReport, Vocabulary};
use crate::error::AcquireResult;
use crate::renderer::RenderedSession;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_ATTEMPTS: u32 = 25;

/// Minimum content indicators for acceptance.
pub const MIN_CONTENT_INDICATORS: usize = 2;
/// Minimum visible text length (characters) for acceptance.
pub const MIN_READY_LENGTH: usize = 2000;

/// Poll budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Log every poll at info level instead of debug.
    pub verbose: bool,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            verbose: false,
        }
    }
}

impl ReadinessConfig {
    /// Upper bound on time spent polling.
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

/// Readiness of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Pending,
    Ready,
    TimedOut,
}

impl ReadinessState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Outcome of one detection run.
#[derive(Debug, Clone)]
pub struct Readiness {
    /// `Ready` or `TimedOut`.
    pub state: ReadinessState,
    /// Number of polls performed.
    pub attempts: u32,
    /// Report from the last poll, if any poll produced text.
    pub last_report: Option<IndicatorReport>,
}

/// Acceptance predicate: enough content indicators, enough text, and not
/// just navigation chrome.
pub fn is_ready(report: &IndicatorReport) -> bool {
    report.content_indicators.len() >= MIN_CONTENT_INDICATORS
        && report.text_length > MIN_READY_LENGTH
        && !report.nav_dominant()
}

/// Polls a session until the acceptance predicate holds.
#[derive(Debug, Clone, Default)]
pub struct ReadinessDetector {
    config: ReadinessConfig,
    vocabulary: Vocabulary,
}

impl ReadinessDetector {
    pub fn new(config: ReadinessConfig, vocabulary: Vocabulary) -> Self {
        Self { config, vocabulary }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Run the poll loop. Returns `Ready` as soon as a poll is accepted,
    /// `TimedOut` after `max_attempts` polls. Session errors propagate; a
    /// crash mid-poll is the orchestrator's to handle.
    pub async fn wait(&self, session: &dyn RenderedSession) -> AcquireResult<Readiness> {
        let mut state = ReadinessState::Pending;
        let mut last_report = None;
        let mut attempts = 0;

        while attempts < self.config.max_attempts {
            tokio::time::sleep(self.config.poll_interval).await;
            attempts += 1;

            let text = session.evaluate_text().await?;
            let report = self.vocabulary.scan(&text);

            if self.config.verbose {
                tracing::info!(
                    attempt = attempts,
                    indicators = ?report.content_indicators,
                    length = report.text_length,
                    nav_dominant = report.nav_dominant(),
                    "readiness poll"
                );
            } else {
                tracing::debug!(
                    attempt = attempts,
                    indicators = report.content_indicators.len(),
                    length = report.text_length,
                    nav_dominant = report.nav_dominant(),
                    "readiness poll"
                );
            }

            let ready = is_ready(&report);
            last_report = Some(report);
            if ready {
                state = ReadinessState::Ready;
                break;
            }
        }

        if state == ReadinessState::Pending {
            state = ReadinessState::TimedOut;
            tracing::warn!(attempts, "document content did not render within the poll budget");
        } else {
            tracing::info!(attempts, "document content rendered");
        }

        Ok(Readiness {
            state,
            attempts,
            last_report,
        })
    }
}
