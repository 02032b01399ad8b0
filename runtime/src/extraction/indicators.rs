// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Keyword vocabularies and the per-snapshot indicator report.
//!
//! Matching is case-insensitive on Unicode lowercase, so `RESOLUÇÃO` and
//! `Resolução` count the same.

use std::collections::BTreeSet;

/// Terms that only appear in the body of a finished regulatory document.
pub const CONTENT_INDICATORS: &[&str] = &[
    "RESOLUÇÃO",
    "BANCO CENTRAL",
    "Art.",
    "Parágrafo",
    "Considerando",
    "Visto",
    "Brasília",
    "INSTRUÇÃO",
    "CIRCULAR",
];

/// Strings present on the portal chrome even before the document renders.
pub const NAV_INDICATORS: &[&str] = &[
    "ACESSIBILIDADE",
    "ALTO CONTRASTE",
    "ENGLISH",
    "Home",
    "Estabilidade",
    "financeira",
    "Essa pagina depende do javascript",
    "habilitar o javascript",
];

/// A pair of keyword lists with their lowercase forms precomputed.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    content: Vec<(String, String)>,
    nav: Vec<(String, String)>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(CONTENT_INDICATORS, NAV_INDICATORS)
    }
}

impl Vocabulary {
    pub fn new(content: &[&str], nav: &[&str]) -> Self {
        let pair = |s: &&str| (s.to_string(), s.to_lowercase());
        Self {
            content: content.iter().map(pair).collect(),
            nav: nav.iter().map(pair).collect(),
        }
    }

    /// Scan `text` once and report which terms it contains.
    pub fn scan(&self, text: &str) -> IndicatorReport {
        let lower = text.to_lowercase();
        let hits = |terms: &[(String, String)]| -> BTreeSet<String> {
            terms
                .iter()
                .filter(|(_, needle)| lower.contains(needle.as_str()))
                .map(|(term, _)| term.clone())
                .collect()
        };
        IndicatorReport {
            content_indicators: hits(&self.content),
            nav_indicators: hits(&self.nav),
            text_length: text.chars().count(),
        }
    }
}

/// Keyword presence and size for one block of text at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndicatorReport {
    pub content_indicators: BTreeSet<String>,
    pub nav_indicators: BTreeSet<String>,
    /// Length in characters.
    pub text_length: usize,
}

impl IndicatorReport {
    /// Navigation chrome is visible and no content indicator is.
    pub fn nav_dominant(&self) -> bool {
        !self.nav_indicators.is_empty() && self.content_indicators.is_empty()
    }

    /// Candidate score: content hits minus half the navigation hits.
    pub fn score(&self) -> f64 {
        self.content_indicators.len() as f64 - 0.5 * self.nav_indicators.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_matching() {
        let report = Vocabulary::default().scan("resolução nº 1 ... art. 1º considerando");
        assert!(report.content_indicators.contains("RESOLUÇÃO"));
        assert!(report.content_indicators.contains("Art."));
        assert!(report.content_indicators.contains("Considerando"));
        assert!(report.nav_indicators.is_empty());
    }

    #[test]
    fn test_shell_page_is_nav_dominant() {
        let report = Vocabulary::default()
            .scan("ACESSIBILIDADE | ALTO CONTRASTE | English | Essa pagina depende do javascript");
        assert!(report.content_indicators.is_empty());
        assert!(report.nav_dominant());
    }

    #[test]
    fn test_any_content_indicator_clears_nav_dominance() {
        let report = Vocabulary::default().scan("Home > Estabilidade financeira > RESOLUÇÃO CMN");
        assert_eq!(report.content_indicators.len(), 1);
        assert!(!report.nav_dominant());
    }

    #[test]
    fn test_document_without_articles_is_not_nav_dominant() {
        let report = Vocabulary::default()
            .scan("Home | ACESSIBILIDADE\nCARTA CIRCULAR 4.100\nBANCO CENTRAL DO BRASIL\nBrasília, 2 de março");
        assert_eq!(report.content_indicators.len(), 3);
        assert!(!report.nav_dominant());
    }

    #[test]
    fn test_body_with_chrome_is_not_nav_dominant() {
        let report = Vocabulary::default().scan("Home ... Art. 1º Fica instituído");
        assert!(!report.nav_dominant());
    }

    #[test]
    fn test_score() {
        let report = Vocabulary::default().scan("RESOLUÇÃO ... Art. 1 ... Considerando ... English");
        assert_eq!(report.score(), 3.0 - 0.5);
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let report = Vocabulary::default().scan("ção");
        assert_eq!(report.text_length, 3);
    }
}
