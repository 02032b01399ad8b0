// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the `normas` binary.

pub mod doctor;
pub mod filename_cmd;
pub mod output;
pub mod replay_cmd;
pub mod reporter;
pub mod run_cmd;

use crate::batch::RunSummary;
use output::OutputMode;
use crate::config::Config;
use crate::store::HeaderStyle;
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

/// Options shared by `run` and `replay`; each overrides the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Registry CSV to read document records from
    #[arg(long)]
    pub registry: Option<PathBuf>,
    /// Directory artifacts are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Visible browser, diagnostic snapshots, verbose readiness logging
    #[arg(long)]
    pub debug: bool,
    /// Seconds to pause between documents
    #[arg(long)]
    pub delay: Option<f64>,
    /// Stop after this many documents
    #[arg(long)]
    pub max_documents: Option<usize>,
    /// Accept a long region even when no region scores positively
    #[arg(long)]
    pub degraded_acceptance: bool,
    /// Skip the direct PDF probe
    #[arg(long)]
    pub no_probe: bool,
    /// Artifact header layout (plain, commented)
    #[arg(long)]
    pub header_style: Option<HeaderStyle>,
    /// Failure ledger location
    #[arg(long)]
    pub ledger: Option<PathBuf>,
    /// Portal origin
    #[arg(long)]
    pub portal_base: Option<String>,
    /// Chromium binary to use
    #[arg(long)]
    pub chromium_path: Option<PathBuf>,
}

impl ConfigArgs {
    /// Environment-derived config with these flags on top.
    pub fn resolve(&self) -> Config {
        let mut config = Config::from_env();
        self.apply(&mut config);
        config
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(registry) = &self.registry {
            config.registry_path = registry.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.debug {
            config.debug = true;
            config.readiness.verbose = true;
        }
        if let Some(delay) = self.delay {
            config.inter_request_delay = std::time::Duration::from_secs_f64(delay.max(0.0));
        }
        if let Some(max) = self.max_documents {
            config.max_documents = Some(max);
        }
        if self.degraded_acceptance {
            config.degraded_acceptance = true;
        }
        if self.no_probe {
            config.probe_direct = false;
        }
        if let Some(style) = self.header_style {
            config.header_style = style;
        }
        if let Some(ledger) = &self.ledger {
            config.ledger_path = Some(ledger.clone());
        }
        if let Some(base) = &self.portal_base {
            config.portal_base = base.clone();
        }
        if let Some(path) = &self.chromium_path {
            config.chromium_path = Some(path.clone());
        }
    }
}

/// Notify `shutdown` on Ctrl-C.
pub(crate) fn interrupt_on_ctrl_c(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after cleanup");
            shutdown.notify_one();
        }
    });
}

/// First `limit` artifact filenames in `dir`, sorted.
pub fn list_artifacts(dir: &Path, limit: usize) -> (usize, Vec<String>) {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|n| n.ends_with(".txt") && !n.starts_with('.'))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    let total = names.len();
    names.truncate(limit);
    (total, names)
}

/// Print the end-of-run report.
pub(crate) fn print_summary(
    mode: OutputMode,
    title: &str,
    summary: &RunSummary,
    output_dir: &Path,
    ledger: &Path,
) {
    let (total, first) = list_artifacts(output_dir, 5);

    if mode.is_json() {
        output::print_json(&json!({
            "summary": summary,
            "output_dir": output_dir.display().to_string(),
            "ledger": ledger.display().to_string(),
            "artifacts_total": total,
            "artifacts_first": first,
        }));
        return;
    }
    if mode.is_quiet() {
        return;
    }

    let s = output::Styled::new();
    eprintln!();
    eprintln!("  {}", s.bold(title));
    eprintln!("  {} saved:    {}", s.ok_sym(), summary.succeeded);
    eprintln!("  {} skipped:  {}", s.ok_sym(), summary.skipped);
    eprintln!("  {} failed:   {}", s.fail_sym(), summary.failed);
    eprintln!("  {} invalid:  {}", s.warn_sym(), summary.invalid);
    if summary.interrupted {
        eprintln!("  {} interrupted before the end of the registry", s.warn_sym());
    }
    eprintln!("  Artifacts in {}: {total}", output_dir.display());
    for name in &first {
        eprintln!("    - {name}");
    }
    if total > first.len() {
        eprintln!("    ... and {} more", total - first.len());
    }
    if summary.failed > 0 {
        eprintln!("  Failures recorded in {}", ledger.display());
    }
}
