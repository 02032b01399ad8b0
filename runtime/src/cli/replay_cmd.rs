// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! `normas replay`: retry the records in the failure ledger.
//!
//! Uses a longer readiness budget and overwrites existing artifacts.
//! Entries that succeed are removed from the ledger.

use super::output::{self, OutputMode};
use super::{interrupt_on_ctrl_c, print_summary, reporter, ConfigArgs};
use crate::batch::BatchRunner;
use crate::renderer::chromium::ChromiumRenderer;
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;

pub async fn run(args: &ConfigArgs, max_polls: Option<u32>, mode: OutputMode) -> Result<()> {
    let config = args.resolve();

    let renderer = ChromiumRenderer::new(config.chromium_path.as_deref())
        .context("no usable browser; run `normas doctor`")?;

    let (tx, rx) = crate::progress::channel();
    let mut runner = BatchRunner::replay_from_config(&config, Arc::new(renderer), max_polls)
        .with_context(|| format!("failed to open ledger {}", config.ledger_path().display()))?
        .with_progress(tx);

    if runner.ledger().is_empty() {
        if mode.is_json() {
            output::print_json(&json!({
                "replayed": 0,
                "ledger": config.ledger_path().display().to_string(),
            }));
        } else if !mode.is_quiet() {
            eprintln!("  Nothing to replay: {} is empty", config.ledger_path().display());
        }
        return Ok(());
    }
    interrupt_on_ctrl_c(runner.shutdown_handle());

    let bar = mode.shows_progress().then(|| reporter::spawn(rx));

    let result = runner.replay().await;
    let ledger_path = runner.ledger().path().to_path_buf();
    let output_dir = runner.store().output_dir().to_path_buf();
    drop(runner);
    if let Some(bar) = bar {
        let _ = bar.await;
    }
    let summary = result.context("replay aborted")?;

    print_summary(mode, "Replay complete", &summary, &output_dir, &ledger_path);
    Ok(())
}
