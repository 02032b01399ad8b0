// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-document strategy fallback.
//!
//! For one record, strategies run in a fixed order and the first success
//! wins. Later strategies are never started once one has succeeded.
//!
//! ```text
//! DirectProbe ──▶ RegistryUrl ──▶ AlternateRender ──▶ SearchForm
//!   (HTTP)         (primary mode)   (other mode)        (primary mode)
//! ```
//!
//! Rendering strategies share one lazily opened session. A `SessionCrash`
//! discards the session, opens a new one and retries the same strategy once.
//! The session is always released before `acquire` returns.

use super::http_client::HttpClient;
use super::portal::{is_document_location, Portal};
use super::probe::find_direct_artifact;
use super::search::{SearchForm, SearchOutcome};
use crate::config::Config;
use crate::error::{AcquireError, AcquireResult, ErrorKind};
use crate::extraction::{sanitize, ContentSelector, ReadinessDetector, ReadinessState, Vocabulary};
use crate::record::DocumentRecord;
use crate::renderer::{RenderMode, RenderedSession, Renderer};
use crate::store::naming::artifact_stem;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sanitized bodies shorter than this are rejected.
pub const MIN_TEXT_LENGTH: usize = 500;

/// Links on a document page that may point at the original file.
pub const SIDECAR_LINKS: &str = "a[href*='.pdf'], a[href*='download']";

const SEARCH_MAX_POLLS: u32 = 5;

/// One ordered way of reaching a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DirectProbe,
    RegistryUrl,
    AlternateRender,
    SearchForm,
}

impl Strategy {
    /// Fixed attempt order.
    pub const ORDER: [Strategy; 4] = [
        Strategy::DirectProbe,
        Strategy::RegistryUrl,
        Strategy::AlternateRender,
        Strategy::SearchForm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::DirectProbe => "direct_probe",
            Strategy::RegistryUrl => "registry_url",
            Strategy::AlternateRender => "alternate_render",
            Strategy::SearchForm => "search_form",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted outcome of one orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub record: DocumentRecord,
    /// Sanitized body.
    pub text: String,
    /// Location the text was captured from.
    pub origin_url: String,
    pub strategy_used: Strategy,
    /// Absolute URLs of downloadable originals found on the page.
    pub sidecar_links: Vec<String>,
    /// Accepted on length alone.
    pub degraded: bool,
}

/// Why one strategy did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: Strategy,
    pub kind: ErrorKind,
    pub message: String,
}

/// Result of [`AcquisitionOrchestrator::acquire`] for a non-fatal run.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    Acquired(ExtractionResult),
    /// Every strategy failed, in attempt order.
    Failed(Vec<StrategyFailure>),
}

/// Orchestrator settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub primary_mode: RenderMode,
    pub navigation_timeout: Duration,
    pub probe_direct: bool,
    /// Where debug snapshots go; `None` disables them.
    pub snapshot_dir: Option<PathBuf>,
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            primary_mode: if config.debug {
                RenderMode::Visible
            } else {
                RenderMode::Headless
            },
            navigation_timeout: config.navigation_timeout,
            probe_direct: config.probe_direct,
            snapshot_dir: config.debug.then(|| config.output_dir.join("debug")),
        }
    }
}

/// Drives the strategy chain for one record at a time.
pub struct AcquisitionOrchestrator {
    renderer: Arc<dyn Renderer>,
    http: HttpClient,
    portal: Portal,
    search: SearchForm,
    detector: ReadinessDetector,
    selector: ContentSelector,
    options: OrchestratorOptions,
    session: Option<Box<dyn RenderedSession>>,
    /// Set once any session has opened; later open failures are per-strategy.
    backend_proven: bool,
}

impl AcquisitionOrchestrator {
    pub fn new(renderer: Arc<dyn Renderer>, http: HttpClient, config: &Config) -> Self {
        let portal = Portal::new(&config.portal_base);
        Self {
            renderer,
            http,
            search: SearchForm::new(
                portal.clone(),
                config.readiness.poll_interval,
                SEARCH_MAX_POLLS,
            ),
            portal,
            detector: ReadinessDetector::new(config.readiness.clone(), Vocabulary::default()),
            selector: ContentSelector::default()
                .with_degraded_acceptance(config.degraded_acceptance),
            options: OrchestratorOptions::from_config(config),
            session: None,
            backend_proven: false,
        }
    }

    /// Strategies this orchestrator will attempt, in order.
    pub fn plan(&self) -> Vec<Strategy> {
        Strategy::ORDER
            .into_iter()
            .filter(|s| *s != Strategy::DirectProbe || self.options.probe_direct)
            .collect()
    }

    /// Run the strategy chain for `record`.
    ///
    /// Returns `Err` only for fatal errors; per-strategy failures are
    /// collected into [`Acquisition::Failed`].
    pub async fn acquire(&mut self, record: &DocumentRecord) -> AcquireResult<Acquisition> {
        let plan = self.plan();
        let last = plan.len().saturating_sub(1);
        let mut failures = Vec::new();

        for (i, strategy) in plan.into_iter().enumerate() {
            debug!(doc = %record.label(), %strategy, "trying strategy");
            match self.attempt(strategy, record, i == last).await {
                Ok(result) => {
                    info!(doc = %record.label(), %strategy, "document acquired");
                    self.release().await;
                    return Ok(Acquisition::Acquired(result));
                }
                Err(e) if e.is_fatal() => {
                    self.release().await;
                    return Err(e);
                }
                Err(e) => {
                    warn!(doc = %record.label(), %strategy, "strategy failed: {e}");
                    failures.push(StrategyFailure {
                        strategy,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.release().await;
        Ok(Acquisition::Failed(failures))
    }

    /// Close the current session, if any.
    pub async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }

    async fn attempt(
        &mut self,
        strategy: Strategy,
        record: &DocumentRecord,
        is_last: bool,
    ) -> AcquireResult<ExtractionResult> {
        let mut result = self.run(strategy, record, is_last).await;
        if let Err(AcquireError::SessionCrash(reason)) = &result {
            warn!(doc = %record.label(), %strategy, "session crashed ({reason}); rebuilding");
            self.release().await;
            result = self.run(strategy, record, is_last).await;
            if matches!(result, Err(AcquireError::SessionCrash(_))) {
                // Never hand a crashed session to the next strategy
                self.release().await;
            }
        }
        result
    }

    async fn run(
        &mut self,
        strategy: Strategy,
        record: &DocumentRecord,
        is_last: bool,
    ) -> AcquireResult<ExtractionResult> {
        let primary = self.options.primary_mode;
        match strategy {
            Strategy::DirectProbe => self.direct_probe(record).await,
            Strategy::RegistryUrl => {
                let url = self.registry_url(record);
                self.render(strategy, primary, record, Some(&url), is_last).await
            }
            Strategy::AlternateRender => {
                let url = self.registry_url(record);
                self.render(strategy, primary.alternate(), record, Some(&url), is_last)
                    .await
            }
            Strategy::SearchForm => {
                let timeout_ms = self.timeout_ms();
                let search = self.search.clone();
                let session = self.session_in(primary).await?;
                let outcome = search.locate(session.as_mut(), record, timeout_ms).await?;
                self.snapshot(record, "search").await;
                match outcome {
                    SearchOutcome::AtDocument(_) => {
                        self.render(strategy, primary, record, None, is_last).await
                    }
                    SearchOutcome::Target(url) => {
                        self.render(strategy, primary, record, Some(&url), is_last).await
                    }
                }
            }
        }
    }

    async fn direct_probe(&self, record: &DocumentRecord) -> AcquireResult<ExtractionResult> {
        let url = find_direct_artifact(&self.http, &self.portal, record)
            .await
            .ok_or_else(|| AcquireError::ContentNotFound("no direct artifact".into()))?;
        Ok(ExtractionResult {
            record: record.clone(),
            text: format!("Documento disponível em PDF: {url}"),
            origin_url: url.clone(),
            strategy_used: Strategy::DirectProbe,
            sidecar_links: vec![url],
            degraded: false,
        })
    }

    /// Navigate (unless the page is already loaded), wait for readiness,
    /// select and sanitize.
    async fn render(
        &mut self,
        strategy: Strategy,
        mode: RenderMode,
        record: &DocumentRecord,
        url: Option<&str>,
        is_last: bool,
    ) -> AcquireResult<ExtractionResult> {
        let timeout_ms = self.timeout_ms();
        let session = self.session_in(mode).await?;
        if let Some(url) = url {
            session.navigate(url, timeout_ms).await?;
        }

        let location = session.current_location().await?;
        if !is_document_location(&location) {
            return Err(AcquireError::navigation(&location, "not a document page"));
        }
        self.snapshot(record, strategy.as_str()).await;

        let session = self.session_ref()?;
        let readiness = self.detector.wait(session).await?;
        if readiness.state == ReadinessState::TimedOut && !is_last {
            return Err(AcquireError::ContentNotFound(format!(
                "page not ready after {} polls",
                readiness.attempts
            )));
        }

        let selection = self.selector.select(session).await?;
        let text = sanitize(&selection.candidate.text);
        let length = text.chars().count();
        if length < MIN_TEXT_LENGTH {
            return Err(AcquireError::ContentNotFound(format!(
                "text too short ({length} characters)"
            )));
        }

        let mut sidecar_links = Vec::new();
        for region in session.find_regions(SIDECAR_LINKS).await? {
            let Some(href) = region.href() else { continue };
            if !href.to_lowercase().contains(".pdf") {
                continue;
            }
            if let Some(link) = self.portal.resolve(&location, &href) {
                if !sidecar_links.contains(&link) {
                    sidecar_links.push(link);
                }
            }
        }

        Ok(ExtractionResult {
            record: record.clone(),
            text,
            origin_url: location,
            strategy_used: strategy,
            sidecar_links,
            degraded: selection.degraded,
        })
    }

    fn registry_url(&self, record: &DocumentRecord) -> String {
        record
            .source_url
            .clone()
            .unwrap_or_else(|| self.portal.document_url(record))
    }

    fn timeout_ms(&self) -> u64 {
        self.options.navigation_timeout.as_millis() as u64
    }

    /// The current session, reopened when the mode differs or none is open.
    async fn session_in(&mut self, mode: RenderMode) -> AcquireResult<&mut Box<dyn RenderedSession>> {
        if self.session.as_ref().is_some_and(|s| s.mode() != mode) {
            self.release().await;
        }
        if self.session.is_none() {
            match self.renderer.open_session(mode).await {
                Ok(session) => {
                    debug!(mode = mode.as_str(), "session opened");
                    self.backend_proven = true;
                    self.session = Some(session);
                }
                // A mode that cannot open after another one has is a strategy failure
                Err(AcquireError::BackendUnavailable(reason)) if self.backend_proven => {
                    return Err(AcquireError::SessionCrash(format!(
                        "{} session unavailable: {reason}",
                        mode.as_str()
                    )));
                }
                Err(e) => return Err(e),
            }
        }
        self.session
            .as_mut()
            .ok_or_else(|| AcquireError::SessionCrash("no open session".into()))
    }

    fn session_ref(&self) -> AcquireResult<&dyn RenderedSession> {
        self.session
            .as_deref()
            .ok_or_else(|| AcquireError::SessionCrash("no open session".into()))
    }

    async fn snapshot(&self, record: &DocumentRecord, label: &str) {
        let (Some(dir), Some(session)) = (&self.options.snapshot_dir, self.session.as_deref()) else {
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            debug!("snapshot directory unavailable: {e}");
            return;
        }
        let stem = artifact_stem(&record.doc_type, &record.number, &record.subject);
        session.snapshot(&dir.join(format!("{stem}_{label}.png"))).await;
    }
}
