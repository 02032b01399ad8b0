// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! Values resolve in three layers: built-in defaults, then `NORMAS_*`
//! environment variables, then CLI flags (applied by the `cli` module).

use crate::extraction::readiness::ReadinessConfig;
use crate::store::HeaderStyle;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REGISTRY: &str = "normativos_spb_bcb.csv";
const DEFAULT_OUTPUT_DIR: &str = "normativos_txt";
const DEFAULT_DELAY_SECS: f64 = 3.0;
const DEFAULT_NAV_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_PORTAL_BASE: &str = "https://www.bcb.gov.br";
const DEFAULT_REPLAY_POLL_MULTIPLIER: u32 = 2;

/// Ledger file name inside the output directory.
pub const LEDGER_FILE: &str = "failed_documents.json";

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source of document records.
    pub registry_path: PathBuf,
    /// Artifact root.
    pub output_dir: PathBuf,
    /// Visible session, diagnostic snapshots, verbose readiness logging.
    pub debug: bool,
    /// Pause between consecutive records.
    pub inter_request_delay: Duration,
    /// Cap for partial runs.
    pub max_documents: Option<usize>,
    /// Upper bound on a single navigation.
    pub navigation_timeout: Duration,
    /// Readiness poll budget.
    pub readiness: ReadinessConfig,
    /// Accept a long candidate even when nothing scores positively.
    pub degraded_acceptance: bool,
    /// Run the direct artifact probe before rendering.
    pub probe_direct: bool,
    /// Artifact header layout.
    pub header_style: HeaderStyle,
    /// Explicit ledger location; defaults to `<output_dir>/failed_documents.json`.
    pub ledger_path: Option<PathBuf>,
    /// Portal origin, e.g. `https://www.bcb.gov.br`.
    pub portal_base: String,
    /// Explicit Chromium binary.
    pub chromium_path: Option<PathBuf>,
    /// Readiness budget multiplier for replays.
    pub replay_poll_multiplier: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            debug: false,
            inter_request_delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            max_documents: None,
            navigation_timeout: Duration::from_millis(DEFAULT_NAV_TIMEOUT_MS),
            readiness: ReadinessConfig::default(),
            degraded_acceptance: false,
            probe_direct: true,
            header_style: HeaderStyle::Plain,
            ledger_path: None,
            portal_base: DEFAULT_PORTAL_BASE.to_string(),
            chromium_path: None,
            replay_poll_multiplier: DEFAULT_REPLAY_POLL_MULTIPLIER,
        }
    }
}

impl Config {
    /// Defaults overlaid with `NORMAS_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let readiness = ReadinessConfig {
            poll_interval: Duration::from_millis(read_env_u64(
                "NORMAS_POLL_INTERVAL_MS",
                defaults.readiness.poll_interval.as_millis() as u64,
            )),
            max_attempts: read_env_u32("NORMAS_MAX_POLLS", defaults.readiness.max_attempts)
                .max(1),
            verbose: false,
        };
        let debug = read_env_bool("NORMAS_DEBUG", defaults.debug);

        Self {
            registry_path: read_env_string("NORMAS_REGISTRY")
                .map(PathBuf::from)
                .unwrap_or(defaults.registry_path),
            output_dir: read_env_string("NORMAS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            debug,
            inter_request_delay: Duration::from_secs_f64(
                read_env_f64("NORMAS_DELAY_SECS", DEFAULT_DELAY_SECS).max(0.0),
            ),
            max_documents: read_env_string("NORMAS_MAX_DOCUMENTS")
                .and_then(|v| v.parse::<usize>().ok()),
            navigation_timeout: Duration::from_millis(
                read_env_u64("NORMAS_NAV_TIMEOUT_MS", DEFAULT_NAV_TIMEOUT_MS).max(1000),
            ),
            readiness: ReadinessConfig {
                verbose: debug,
                ..readiness
            },
            degraded_acceptance: read_env_bool(
                "NORMAS_DEGRADED_ACCEPTANCE",
                defaults.degraded_acceptance,
            ),
            probe_direct: read_env_bool("NORMAS_PROBE_DIRECT", defaults.probe_direct),
            header_style: read_env_string("NORMAS_HEADER_STYLE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.header_style),
            ledger_path: read_env_string("NORMAS_LEDGER").map(PathBuf::from),
            portal_base: read_env_string("NORMAS_PORTAL_BASE").unwrap_or(defaults.portal_base),
            chromium_path: read_env_string("NORMAS_CHROMIUM_PATH").map(PathBuf::from),
            replay_poll_multiplier: read_env_u32(
                "NORMAS_REPLAY_POLL_MULTIPLIER",
                DEFAULT_REPLAY_POLL_MULTIPLIER,
            )
            .max(1),
        }
    }

    /// Where the failure ledger lives for this configuration.
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(LEDGER_FILE))
    }

    /// Readiness budget used by the replay entry point.
    pub fn replay_readiness(&self) -> ReadinessConfig {
        ReadinessConfig {
            max_attempts: self
                .readiness
                .max_attempts
                .saturating_mul(self.replay_poll_multiplier),
            ..self.readiness.clone()
        }
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, default_value: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_value)
}

fn read_env_u32(name: &str, default_value: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default_value)
}

fn read_env_f64(name: &str, default_value: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default_value)
}

fn read_env_bool(name: &str, default_value: bool) -> bool {
    match read_env_string(name) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default_value,
    }
}
