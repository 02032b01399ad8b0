// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Search-form workflow.
//!
//! Submits the document number into the portal's search page and turns the
//! result list into a document page location. Disambiguation prefers the
//! entry whose text names both the type and the number; otherwise the first
//! entry wins; with no entries at all the canonical URL is used.

use super::portal::{is_document_location, Portal};
use crate::error::{AcquireError, AcquireResult};
use crate::record::DocumentRecord;
use crate::renderer::{Region, RenderedSession};
use std::time::Duration;
use tracing::{debug, info};

/// The number input on the search page.
pub const NUMBER_INPUT: &str = "#numero";

/// Submit button candidates, tried in order.
pub const SUBMIT_BUTTONS: &[&str] = &[
    "button[title='Buscar conteúdo no site']",
    "button.btn-primary",
    "button[type='button']",
    "input[type='submit']",
    ".btn-primary",
];

/// Result entry descriptors, tried in order; the first that matches wins.
pub const RESULT_DESCRIPTORS: &[&str] = &[
    ".resultado-busca",
    ".result-item",
    ".search-result",
    "a[href*='exibenormativo']",
    ".normativo-item",
    ".documento-item",
    ".list-group-item",
    ".card",
];

/// Alert containers that may announce an empty result set.
pub const NO_RESULT_ALERTS: &[&str] = &[".alert", ".no-results", ".alert-warning", ".alert-info"];

const NO_RESULT_PHRASES: &[&str] = &["nenhum", "não encontrado"];

/// Where the search workflow ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The form redirected straight to the document page; it is already loaded.
    AtDocument(String),
    /// Navigate here to reach the document.
    Target(String),
}

/// Drives the search page.
#[derive(Debug, Clone)]
pub struct SearchForm {
    portal: Portal,
    poll_interval: Duration,
    max_polls: u32,
}

impl SearchForm {
    pub fn new(portal: Portal, poll_interval: Duration, max_polls: u32) -> Self {
        Self {
            portal,
            poll_interval,
            max_polls,
        }
    }

    /// Submit the record's number and resolve the result list.
    pub async fn locate(
        &self,
        session: &mut dyn RenderedSession,
        record: &DocumentRecord,
        timeout_ms: u64,
    ) -> AcquireResult<SearchOutcome> {
        let search_url = self.portal.search_url();
        session.navigate(&search_url, timeout_ms).await?;
        session.fill(NUMBER_INPUT, record.clean_number()).await?;

        let mut submitted = false;
        for button in SUBMIT_BUTTONS {
            if session.click(button).await? {
                debug!(button, "search submitted");
                submitted = true;
                break;
            }
        }
        if !submitted {
            return Err(AcquireError::ContentNotFound("search submit button not found".into()));
        }

        let mut results = Vec::new();
        for _ in 0..self.max_polls {
            let location = session.current_location().await?;
            if is_document_location(&location) {
                info!(%location, "search redirected to document");
                return Ok(SearchOutcome::AtDocument(location));
            }
            results = collect_results(session).await?;
            if !results.is_empty() || announces_no_results(session).await? {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let location = session.current_location().await?;
        let target = pick_result(&results, record)
            .and_then(|region| region.href())
            .and_then(|href| self.portal.resolve(&location, &href));

        Ok(SearchOutcome::Target(match target {
            Some(url) => url,
            None => {
                info!(doc = %record.label(), "no usable search result; using canonical URL");
                self.portal.document_url(record)
            }
        }))
    }
}

async fn collect_results(session: &dyn RenderedSession) -> AcquireResult<Vec<Region>> {
    for descriptor in RESULT_DESCRIPTORS {
        let regions = session.find_regions(descriptor).await?;
        if !regions.is_empty() {
            debug!(descriptor, count = regions.len(), "search results found");
            return Ok(regions);
        }
    }
    Ok(Vec::new())
}

async fn announces_no_results(session: &dyn RenderedSession) -> AcquireResult<bool> {
    for descriptor in NO_RESULT_ALERTS {
        for alert in session.find_regions(descriptor).await? {
            let text = alert.text().to_lowercase();
            if NO_RESULT_PHRASES.iter().any(|p| text.contains(p)) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// The entry naming both type and number, else the first entry.
pub fn pick_result<'a>(results: &'a [Region], record: &DocumentRecord) -> Option<&'a Region> {
    let doc_type = record.doc_type.to_lowercase();
    let number = record.clean_number().to_lowercase();
    results
        .iter()
        .find(|r| {
            let text = r.text().to_lowercase();
            text.contains(&doc_type) && text.contains(&number)
        })
        .or_else(|| results.first())
}
