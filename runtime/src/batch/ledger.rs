// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Failure ledger: the records every strategy failed on, kept as JSON so a
//! later replay can retry exactly those.

use crate::acquisition::{Strategy, StrategyFailure};
use crate::error::{AcquireResult, ErrorKind};
use crate::record::DocumentRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One failed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub record: DocumentRecord,
    /// Strategies attempted, in order.
    pub strategies_tried: Vec<Strategy>,
    pub last_error_kind: ErrorKind,
    pub failed_at: DateTime<Utc>,
}

/// Persistent list of failed records, at most one entry per record identity.
#[derive(Debug)]
pub struct FailureLedger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
    dirty: bool,
}

impl FailureLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> AcquireResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a total failure, replacing any earlier entry for the same record.
    pub fn record_failure(&mut self, record: &DocumentRecord, failures: &[StrategyFailure]) {
        let entry = LedgerEntry {
            record: record.clone(),
            strategies_tried: failures.iter().map(|f| f.strategy).collect(),
            last_error_kind: failures
                .last()
                .map(|f| f.kind)
                .unwrap_or(ErrorKind::ContentNotFound),
            failed_at: Utc::now(),
        };
        match self.position(record) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
        self.dirty = true;
    }

    /// Drop the entry for `record`. Returns whether one existed.
    pub fn remove(&mut self, record: &DocumentRecord) -> bool {
        match self.position(record) {
            Some(i) => {
                self.entries.remove(i);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Write the ledger if it changed since the last save.
    pub fn flush(&mut self) -> AcquireResult<()> {
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }

    /// Write the ledger unconditionally, through a temporary sibling file.
    pub fn save(&mut self) -> AcquireResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        tracing::debug!("ledger saved ({} entries) to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    fn position(&self, record: &DocumentRecord) -> Option<usize> {
        self.entries.iter().position(|e| e.record.id() == record.id())
    }
}
