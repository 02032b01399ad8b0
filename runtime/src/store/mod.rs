// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Artifact persistence.
//!
//! One text file per document under the output root, named by
//! [`naming::artifact_filename`]. The file's existence is the only
//! "already done" marker. Writes go through a temporary sibling and a
//! rename, so a reader never sees a half-written artifact.
//!
//! PDF sidecars land in `<output>/normativos_pdf/` with the artifact's stem.
//! Sidecar failures are logged and never fail the document.

pub mod naming;

use crate::acquisition::{ExtractionResult, HttpClient};
use crate::error::{AcquireError, AcquireResult};
use crate::record::DocumentRecord;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Subdirectory of the output root holding PDF sidecars.
pub const SIDECAR_DIR: &str = "normativos_pdf";

/// Timeout for one sidecar download.
pub const SIDECAR_TIMEOUT: Duration = Duration::from_secs(30);

const SEPARATOR_WIDTH: usize = 80;

/// Layout of the artifact header block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// `Tipo:` / `Número:` / `Data:` / `URL:` lines.
    #[default]
    Plain,
    /// `#`-prefixed lines with access time and subject.
    Commented,
}

impl FromStr for HeaderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "commented" => Ok(Self::Commented),
            other => Err(format!("unknown header style '{other}' (expected plain or commented)")),
        }
    }
}

impl std::fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Plain => "plain",
            Self::Commented => "commented",
        })
    }
}

/// Outcome of [`ResultStore::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Written {
        artifact: PathBuf,
        sidecar: Option<PathBuf>,
    },
    /// The artifact already existed; nothing was touched.
    Skipped(PathBuf),
}

/// Writes artifacts and sidecars under one output root.
#[derive(Clone)]
pub struct ResultStore {
    output_dir: PathBuf,
    header_style: HeaderStyle,
    http: HttpClient,
}

impl ResultStore {
    pub fn new(output_dir: impl Into<PathBuf>, header_style: HeaderStyle, http: HttpClient) -> Self {
        Self {
            output_dir: output_dir.into(),
            header_style,
            http,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic artifact location for `record`.
    pub fn artifact_path(&self, record: &DocumentRecord) -> PathBuf {
        self.output_dir.join(naming::artifact_filename(
            &record.doc_type,
            &record.number,
            &record.subject,
        ))
    }

    /// Sidecar location for `record`.
    pub fn sidecar_path(&self, record: &DocumentRecord) -> PathBuf {
        let artifact = naming::artifact_filename(&record.doc_type, &record.number, &record.subject);
        self.output_dir
            .join(SIDECAR_DIR)
            .join(naming::sidecar_filename(&artifact))
    }

    /// Whether the artifact for `record` is already on disk.
    pub fn exists(&self, record: &DocumentRecord) -> bool {
        self.artifact_path(record).exists()
    }

    /// Write the artifact, then try the sidecar.
    ///
    /// Without `force`, an existing artifact short-circuits to
    /// [`Persisted::Skipped`] before any I/O beyond the existence check.
    pub async fn persist(&self, result: &ExtractionResult, force: bool) -> AcquireResult<Persisted> {
        let artifact = self.artifact_path(&result.record);
        if !force && artifact.exists() {
            info!("artifact exists, skipping: {}", artifact.display());
            return Ok(Persisted::Skipped(artifact));
        }

        let contents = render_artifact(self.header_style, result, Local::now());
        write_atomic(&artifact, contents.as_bytes()).await?;
        info!(
            doc = %result.record.label(),
            strategy = %result.strategy_used,
            "saved {}",
            artifact.display()
        );

        let sidecar = self.fetch_sidecar(result).await;
        Ok(Persisted::Written { artifact, sidecar })
    }

    /// First sidecar link that downloads cleanly.
    async fn fetch_sidecar(&self, result: &ExtractionResult) -> Option<PathBuf> {
        let path = self.sidecar_path(&result.record);
        for url in &result.sidecar_links {
            let bytes = match self.http.download(url, SIDECAR_TIMEOUT).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(doc = %result.record.label(), "{e}");
                    continue;
                }
            };
            match write_atomic(&path, &bytes).await {
                Ok(()) => {
                    info!("sidecar saved: {}", path.display());
                    return Some(path);
                }
                Err(e) => {
                    let err = AcquireError::SidecarDownload {
                        url: url.clone(),
                        reason: e.to_string(),
                    };
                    warn!(doc = %result.record.label(), "{err}");
                }
            }
        }
        None
    }
}

/// Header block followed by the body.
pub fn render_artifact(style: HeaderStyle, result: &ExtractionResult, accessed: DateTime<Local>) -> String {
    let record = &result.record;
    let header = match style {
        HeaderStyle::Plain => format!(
            "Tipo: {}\nNúmero: {}\nData: {}\nURL: {}\n{}\n",
            record.doc_type,
            record.number,
            record.date,
            result.origin_url,
            "=".repeat(SEPARATOR_WIDTH)
        ),
        HeaderStyle::Commented => format!(
            "# {} nro. {}\n# Data de acesso: {}\n# Assunto: {}\n# URL: {}\n# {}\n",
            record.doc_type,
            record.number,
            accessed.format("%d/%m/%Y %H:%M:%S"),
            record.subject,
            result.origin_url,
            "=".repeat(SEPARATOR_WIDTH - 2)
        ),
    };
    format!("{header}\n{}", result.text)
}

/// Write to a temporary sibling, then rename into place.
async fn write_atomic(path: &Path, contents: &[u8]) -> AcquireResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
