// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: synthetic portal pages and a fast configuration.

#![allow(dead_code)]

use normas_runtime::acquisition::Portal;
use normas_runtime::config::Config;
use normas_runtime::extraction::ReadinessConfig;
use normas_runtime::record::DocumentRecord;
use normas_runtime::renderer::scripted::PageScript;
use std::path::Path;
use std::time::Duration;

pub const PORTAL: &str = "https://portal.test";

/// Text free of every indicator and marker.
pub fn filler(repeats: usize) -> String {
    "texto corrido sem marcadores ".repeat(repeats)
}

/// What the portal shows before its scripts run.
pub fn shell_text() -> String {
    "ACESSIBILIDADE | ALTO CONTRASTE | ENGLISH | Home\nEssa pagina depende do javascript".into()
}

/// A finished document body: three content indicators, four blank lines
/// between the title and the first article, about 5000 characters.
pub fn document_body() -> String {
    format!(
        "RESOLUÇÃO CMN Nº 4.734\n\n\n\n\nArt. 1º Esta Resolução dispõe sobre limites.\n\nConsiderando o disposto {}",
        filler(170)
    )
}

/// Whole-page text of a rendered document, chrome included.
pub fn rendered_page() -> String {
    format!("Home | ACESSIBILIDADE\n{}", document_body())
}

/// A document page: `shell_frames` polls of shell text, then the document;
/// a specific container scoring 3 and a body scoring 1.
pub fn document_page(shell_frames: usize) -> PageScript {
    let mut frames = vec![shell_text(); shell_frames];
    frames.push(rendered_page());
    PageScript::new()
        .frames(frames)
        .region(".documento-conteudo", document_body(), "<div class=\"documento-conteudo\"></div>")
        .region(
            "body",
            format!("RESOLUÇÃO Art. ACESSIBILIDADE ENGLISH {}", filler(60)),
            "<body></body>",
        )
}

/// A page that renders chrome forever.
pub fn stuck_page() -> PageScript {
    PageScript::new()
        .frames([format!("RESOLUÇÃO | Home | ACESSIBILIDADE {}", filler(100))])
        .region("body", format!("Home {}", filler(60)), "<body></body>")
}

pub fn scenario_record() -> DocumentRecord {
    let mut record = DocumentRecord {
        doc_type: "Resolução CMN".into(),
        number: "4.734".into(),
        date: "27/6/2019".into(),
        subject: "limites operacionais e requisitos".into(),
        source_url: None,
    };
    record.source_url = Some(Portal::new(PORTAL).document_url(&record));
    record
}

pub fn record(doc_type: &str, number: &str, subject: &str) -> DocumentRecord {
    let mut record = DocumentRecord {
        doc_type: doc_type.into(),
        number: number.into(),
        date: "1/1/2020".into(),
        subject: subject.into(),
        source_url: None,
    };
    record.source_url = Some(Portal::new(PORTAL).document_url(&record));
    record
}

/// Millisecond polls, no pacing, no direct probe.
pub fn fast_config(output_dir: &Path) -> Config {
    Config {
        output_dir: output_dir.to_path_buf(),
        inter_request_delay: Duration::ZERO,
        readiness: ReadinessConfig {
            poll_interval: Duration::from_millis(1),
            max_attempts: 25,
            verbose: false,
        },
        probe_direct: false,
        portal_base: PORTAL.into(),
        ..Config::default()
    }
}
