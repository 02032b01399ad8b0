// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal progress bar fed by the batch runner's progress channel.

use crate::progress::{ProgressEventKind, ProgressReceiver};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render events until the run finishes or the channel closes.
pub fn spawn(mut rx: ProgressReceiver) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let pb = progress_bar();
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match event.event {
                ProgressEventKind::RunStarted { total, .. } => pb.set_length(total as u64),
                ProgressEventKind::DocumentStarted { label, .. } => pb.set_message(label),
                ProgressEventKind::StrategyFailed { label, strategy, kind } => {
                    pb.println(format!("  ! {label}: {strategy} failed ({kind})"));
                }
                ProgressEventKind::DocumentSaved { .. } | ProgressEventKind::DocumentSkipped { .. } => {
                    pb.inc(1)
                }
                ProgressEventKind::DocumentFailed { label, kind } => {
                    pb.inc(1);
                    pb.println(format!("  ✗ {label} ({kind})"));
                }
                ProgressEventKind::InvalidRow { message, .. } => {
                    pb.println(format!("  ! {message}"));
                }
                ProgressEventKind::RunFinished { .. } => break,
            }
        }
        pb.finish_and_clear();
    })
}
