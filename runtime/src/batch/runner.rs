// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sequential batch runner.
//!
//! One record at a time, start to finish, with a fixed pause between records
//! that touch the network. Per-record failures become tally entries and
//! ledger entries; only a fatal backend error aborts the run. An interrupt
//! through [`BatchRunner::shutdown_handle`] stops the in-flight record,
//! releases its session and flushes the ledger.

use super::ledger::FailureLedger;
use crate::acquisition::{Acquisition, AcquisitionOrchestrator, HttpClient, StrategyFailure};
use crate::config::Config;
use crate::error::{AcquireError, AcquireResult, ErrorKind};
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::record::DocumentRecord;
use crate::renderer::Renderer;
use crate::store::{Persisted, ResultStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Timeout for plain HTTP requests (probes, sidecars use their own).
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-run knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Pause between consecutive records that reach the network.
    pub delay: Duration,
    pub max_documents: Option<usize>,
    /// Ignore existing artifacts and overwrite them.
    pub force: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            delay: config.inter_request_delay,
            max_documents: config.max_documents,
            force: false,
        }
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub invalid: usize,
    pub interrupted: bool,
    /// Artifacts written during this run, in order.
    pub saved: Vec<PathBuf>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

enum Outcome {
    Saved(PathBuf),
    Skipped(PathBuf),
    Failed(Vec<StrategyFailure>),
}

/// Drives the orchestrator over a list of records.
pub struct BatchRunner {
    orchestrator: AcquisitionOrchestrator,
    store: ResultStore,
    ledger: FailureLedger,
    options: RunOptions,
    progress: Option<ProgressSender>,
    shutdown: Arc<Notify>,
    run_id: String,
    seq: u64,
}

impl BatchRunner {
    pub fn new(
        orchestrator: AcquisitionOrchestrator,
        store: ResultStore,
        ledger: FailureLedger,
        options: RunOptions,
    ) -> Self {
        Self {
            orchestrator,
            store,
            ledger,
            options,
            progress: None,
            shutdown: Arc::new(Notify::new()),
            run_id: uuid::Uuid::new_v4().to_string(),
            seq: 0,
        }
    }

    /// Wire every component from `config`.
    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> AcquireResult<Self> {
        let http = HttpClient::new(HTTP_TIMEOUT);
        let orchestrator = AcquisitionOrchestrator::new(renderer, http.clone(), config);
        let store = ResultStore::new(&config.output_dir, config.header_style, http);
        let ledger = FailureLedger::open(config.ledger_path())?;
        Ok(Self::new(orchestrator, store, ledger, RunOptions::from_config(config)))
    }

    /// Runner for the replay entry point: longer readiness budget, existing
    /// artifacts overwritten. `max_polls` replaces the replay budget.
    pub fn replay_from_config(
        config: &Config,
        renderer: Arc<dyn Renderer>,
        max_polls: Option<u32>,
    ) -> AcquireResult<Self> {
        let mut readiness = config.replay_readiness();
        if let Some(max_polls) = max_polls {
            readiness.max_attempts = max_polls.max(1);
        }
        let replay_config = Config {
            readiness,
            ..config.clone()
        };
        let mut runner = Self::from_config(&replay_config, renderer)?;
        runner.options.force = true;
        Ok(runner)
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Notify to interrupt the run.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Retry every ledger entry.
    pub async fn replay(&mut self) -> AcquireResult<RunSummary> {
        let rows = self
            .ledger
            .entries()
            .iter()
            .map(|e| Ok(e.record.clone()))
            .collect();
        info!("replaying {} ledger entries", self.ledger.len());
        self.run(rows).await
    }

    /// Process registry rows in order.
    pub async fn run(&mut self, rows: Vec<AcquireResult<DocumentRecord>>) -> AcquireResult<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("skipping row: {e}");
                    summary.invalid += 1;
                    let row = match &e {
                        AcquireError::RecordInvalid { row, .. } => *row,
                        _ => 0,
                    };
                    self.emit(ProgressEventKind::InvalidRow {
                        row,
                        message: e.to_string(),
                    });
                }
            }
        }
        if let Some(max) = self.options.max_documents {
            records.truncate(max);
        }

        info!(
            "run started: {} records, {} invalid rows, delay {:?}",
            records.len(),
            summary.invalid,
            self.options.delay
        );
        self.emit(ProgressEventKind::RunStarted {
            total: records.len(),
            invalid_rows: summary.invalid,
        });

        let shutdown = self.shutdown.clone();
        let mut touched_network = false;

        for (index, record) in records.iter().enumerate() {
            let label = record.label();

            if !self.options.force && self.store.exists(record) {
                let path = self.store.artifact_path(record);
                info!("artifact exists, skipping: {}", path.display());
                summary.skipped += 1;
                self.ledger.remove(record);
                self.emit(ProgressEventKind::DocumentSkipped {
                    label,
                    path: path.display().to_string(),
                });
                continue;
            }

            if touched_network && !self.options.delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.options.delay) => {}
                    _ = shutdown.notified() => {
                        summary.interrupted = true;
                        break;
                    }
                }
            }
            touched_network = true;

            info!("processing {label} ({}/{})", index + 1, records.len());
            self.emit(ProgressEventKind::DocumentStarted {
                index,
                label: label.clone(),
            });

            let outcome = tokio::select! {
                outcome = self.process(record) => outcome,
                _ = shutdown.notified() => {
                    summary.interrupted = true;
                    break;
                }
            };

            match outcome {
                Ok(Outcome::Saved(path)) => {
                    summary.succeeded += 1;
                    self.ledger.remove(record);
                    summary.saved.push(path);
                }
                Ok(Outcome::Skipped(path)) => {
                    summary.skipped += 1;
                    self.ledger.remove(record);
                    self.emit(ProgressEventKind::DocumentSkipped {
                        label,
                        path: path.display().to_string(),
                    });
                }
                Ok(Outcome::Failed(failures)) => {
                    summary.failed += 1;
                    let kind = failures
                        .last()
                        .map(|f| f.kind)
                        .unwrap_or(ErrorKind::ContentNotFound);
                    error!("all strategies failed for {label} (last: {kind})");
                    self.ledger.record_failure(record, &failures);
                    if let Err(e) = self.ledger.flush() {
                        warn!("failed to write ledger: {e}");
                    }
                    self.emit(ProgressEventKind::DocumentFailed { label, kind });
                }
                Err(e) => {
                    error!("aborting run: {e}");
                    self.orchestrator.release().await;
                    self.ledger.flush()?;
                    return Err(e);
                }
            }
        }

        if summary.interrupted {
            warn!("run interrupted; releasing session");
            self.orchestrator.release().await;
        }
        self.ledger.flush()?;

        info!(
            "run finished: {} saved, {} skipped, {} failed, {} invalid",
            summary.succeeded, summary.skipped, summary.failed, summary.invalid
        );
        self.emit(ProgressEventKind::RunFinished {
            succeeded: summary.succeeded,
            skipped: summary.skipped,
            failed: summary.failed,
            invalid: summary.invalid,
            interrupted: summary.interrupted,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        Ok(summary)
    }

    async fn process(&mut self, record: &DocumentRecord) -> AcquireResult<Outcome> {
        let failures = match self.orchestrator.acquire(record).await? {
            Acquisition::Acquired(result) => {
                match self.store.persist(&result, self.options.force).await {
                    Ok(Persisted::Written { artifact, .. }) => {
                        self.emit(ProgressEventKind::DocumentSaved {
                            label: record.label(),
                            strategy: result.strategy_used,
                            path: artifact.display().to_string(),
                        });
                        return Ok(Outcome::Saved(artifact));
                    }
                    Ok(Persisted::Skipped(path)) => return Ok(Outcome::Skipped(path)),
                    Err(e) => vec![StrategyFailure {
                        strategy: result.strategy_used,
                        kind: e.kind(),
                        message: e.to_string(),
                    }],
                }
            }
            Acquisition::Failed(failures) => failures,
        };

        for failure in &failures {
            self.emit(ProgressEventKind::StrategyFailed {
                label: record.label(),
                strategy: failure.strategy,
                kind: failure.kind,
            });
        }
        Ok(Outcome::Failed(failures))
    }

    fn emit(&mut self, event: ProgressEventKind) {
        progress::emit(&self.progress, &self.run_id, &mut self.seq, event);
    }
}
