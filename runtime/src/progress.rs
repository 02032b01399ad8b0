// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress events and broadcast channel for batch runs.
//!
//! The batch runner emits `ProgressEvent`s through a `tokio::sync::broadcast`
//! channel to any subscriber (the CLI progress bar, JSON event output).
//! When no subscriber exists, events are silently dropped.

use crate::acquisition::Strategy;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// A progress event emitted during a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The registry is loaded; `total` records will be attempted.
    RunStarted { total: usize, invalid_rows: usize },
    /// A record entered the strategy chain.
    DocumentStarted { index: usize, label: String },
    /// One strategy failed; the next one follows.
    StrategyFailed {
        label: String,
        strategy: Strategy,
        kind: ErrorKind,
    },
    /// An artifact was written.
    DocumentSaved {
        label: String,
        strategy: Strategy,
        path: String,
    },
    /// The artifact already existed.
    DocumentSkipped { label: String, path: String },
    /// Every strategy failed.
    DocumentFailed { label: String, kind: ErrorKind },
    /// A registry row could not be turned into a record.
    InvalidRow { row: usize, message: String },
    /// The run is over, normally or by interrupt.
    RunFinished {
        succeeded: usize,
        skipped: usize,
        failed: usize,
        invalid: usize,
        interrupted: bool,
        elapsed_ms: u64,
    },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a progress broadcast channel.
///
/// A lagging subscriber loses the oldest events, never blocks the run.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emit a progress event, ignoring send errors (no receivers listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}
