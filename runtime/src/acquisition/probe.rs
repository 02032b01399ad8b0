// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Direct artifact probe: the cheapest strategy, no rendering at all.

use super::http_client::HttpClient;
use super::portal::Portal;
use crate::record::DocumentRecord;
use std::time::Duration;
use tracing::debug;

/// Per-URL probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// First candidate URL that answers 200 with a PDF content type.
///
/// Transport errors on one candidate are logged and the next is tried.
pub async fn find_direct_artifact(
    http: &HttpClient,
    portal: &Portal,
    record: &DocumentRecord,
) -> Option<String> {
    for url in portal.artifact_urls(record) {
        match http.probe(&url, PROBE_TIMEOUT).await {
            Ok(resp) if resp.is_pdf() => {
                debug!(%url, "direct artifact found");
                return Some(url);
            }
            Ok(resp) => debug!(%url, status = resp.status, "probe miss"),
            Err(e) => debug!(%url, error = %e, "probe failed"),
        }
    }
    None
}
