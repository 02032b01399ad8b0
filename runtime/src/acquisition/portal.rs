// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! URL layout of the regulatory portal.

use crate::record::DocumentRecord;
use url::Url;

const DOCUMENT_PATH: &str = "/estabilidadefinanceira/exibenormativo";
const SEARCH_PATH: &str = "/estabilidadefinanceira/buscanormas";
const ARTIFACT_DIRS: &[&str] = &[
    "/estabilidadefinanceira/normativo/pdf/",
    "/estabilidadefinanceira/normativo/",
];

/// Marker present in every document page location.
pub const DOCUMENT_MARKER: &str = "exibenormativo";

/// The portal origin and the URLs derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    base: String,
}

impl Portal {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Canonical document page for a record.
    pub fn document_url(&self, record: &DocumentRecord) -> String {
        format!(
            "{}{DOCUMENT_PATH}?tipo={}&numero={}",
            self.base,
            quote(&record.doc_type),
            quote(record.clean_number())
        )
    }

    /// Search form page.
    pub fn search_url(&self) -> String {
        format!("{}{SEARCH_PATH}", self.base)
    }

    /// Candidate locations of a directly downloadable artifact, most likely first.
    pub fn artifact_urls(&self, record: &DocumentRecord) -> Vec<String> {
        let doc_type = quote(&record.doc_type);
        let number = quote(record.clean_number());
        ARTIFACT_DIRS
            .iter()
            .flat_map(|dir| {
                [
                    format!("{}{dir}{doc_type}_{number}.pdf", self.base),
                    format!("{}{dir}{doc_type}_{number}.0.pdf", self.base),
                ]
            })
            .collect()
    }

    /// Resolve a possibly relative `href` against the page it was found on.
    pub fn resolve(&self, page_url: &str, href: &str) -> Option<String> {
        let base = Url::parse(page_url)
            .or_else(|_| Url::parse(&format!("{}/", self.base)))
            .ok()?;
        base.join(href).ok().map(|u| u.to_string())
    }
}

/// Whether `location` is a rendered document page.
pub fn is_document_location(location: &str) -> bool {
    location.contains(DOCUMENT_MARKER)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DocumentRecord {
        DocumentRecord {
            doc_type: "Resolução CMN".into(),
            number: "4.734".into(),
            date: "27/6/2019".into(),
            subject: "limites operacionais".into(),
            source_url: None,
        }
    }

    #[test]
    fn test_document_url_matches_registry_form() {
        let portal = Portal::new("https://www.bcb.gov.br/");
        assert_eq!(portal.base(), "https://www.bcb.gov.br");
        assert_eq!(
            portal.document_url(&record()),
            "https://www.bcb.gov.br/estabilidadefinanceira/exibenormativo?tipo=Resolu%C3%A7%C3%A3o%20CMN&numero=4.734"
        );
        assert!(is_document_location(&portal.document_url(&record())));
    }

    #[test]
    fn test_artifact_urls() {
        let portal = Portal::new("https://www.bcb.gov.br");
        let urls = portal.artifact_urls(&record());
        assert_eq!(urls.len(), 4);
        assert_eq!(
            urls[0],
            "https://www.bcb.gov.br/estabilidadefinanceira/normativo/pdf/Resolu%C3%A7%C3%A3o%20CMN_4.734.pdf"
        );
        assert!(urls[1].ends_with("_4.734.0.pdf"));
        assert!(!urls[2].contains("/pdf/"));
    }

    #[test]
    fn test_trailing_float_suffix_dropped() {
        let mut rec = record();
        rec.number = "501.0".into();
        assert!(Portal::new("https://x").document_url(&rec).ends_with("numero=501"));
    }

    #[test]
    fn test_resolve_relative() {
        let portal = Portal::new("https://www.bcb.gov.br");
        let resolved = portal.resolve(
            "https://www.bcb.gov.br/estabilidadefinanceira/buscanormas",
            "/estabilidadefinanceira/exibenormativo?tipo=Circular&numero=1",
        );
        assert_eq!(
            resolved.as_deref(),
            Some("https://www.bcb.gov.br/estabilidadefinanceira/exibenormativo?tipo=Circular&numero=1")
        );
        assert_eq!(
            portal.resolve("about:blank", "https://cdn.example/doc.pdf").as_deref(),
            Some("https://cdn.example/doc.pdf")
        );
    }
}
