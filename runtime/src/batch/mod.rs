// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batch processing of the registry and replay of past failures.

pub mod ledger;
pub mod runner;

pub use ledger::{FailureLedger, LedgerEntry};
pub use runner::{BatchRunner, RunOptions, RunSummary};
