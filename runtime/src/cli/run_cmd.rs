// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! `normas run`: acquire every document in the registry.

use super::output::OutputMode;
use super::{interrupt_on_ctrl_c, print_summary, reporter, ConfigArgs};
use crate::batch::BatchRunner;
use crate::record::load_registry;
use crate::renderer::chromium::ChromiumRenderer;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub async fn run(args: &ConfigArgs, mode: OutputMode) -> Result<()> {
    let config = args.resolve();
    info!(
        "registry={} output={} debug={} probe={}",
        config.registry_path.display(),
        config.output_dir.display(),
        config.debug,
        config.probe_direct
    );

    let rows = load_registry(&config.registry_path).with_context(|| {
        format!("failed to read registry {}", config.registry_path.display())
    })?;

    let renderer = ChromiumRenderer::new(config.chromium_path.as_deref())
        .context("no usable browser; run `normas doctor`")?;

    let (tx, rx) = crate::progress::channel();
    let mut runner = BatchRunner::from_config(&config, Arc::new(renderer))
        .context("failed to set up runner")?
        .with_progress(tx);
    interrupt_on_ctrl_c(runner.shutdown_handle());

    let bar = mode.shows_progress().then(|| reporter::spawn(rx));

    let result = runner.run(rows).await;
    let ledger_path = runner.ledger().path().to_path_buf();
    let output_dir = runner.store().output_dir().to_path_buf();
    // Dropping the runner closes the progress channel
    drop(runner);
    if let Some(bar) = bar {
        let _ = bar.await;
    }
    let summary = result.context("run aborted")?;

    print_summary(mode, "Run complete", &summary, &output_dir, &ledger_path);
    Ok(())
}
