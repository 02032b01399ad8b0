// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Content region selection.
//!
//! Walks an ordered list of region descriptors (most specific first), scores
//! every sufficiently long region by keyword content, and picks the best one.
//! Ties go to the earlier descriptor: a structurally correct container beats
//! a generic wrapper that happens to have the same keyword density.
//!
//! # Acceptance
//!
//! | best score | any region over the floor | degraded acceptance | result            |
//! |------------|---------------------------|---------------------|-------------------|
//! | `> 0`      | yes                       | either              | accepted          |
//! | `<= 0`     | yes                       | on                  | accepted, degraded|
//! | `<= 0`     | yes                       | off                 | `ContentNotFound` |
//! | n/a        | no                        | either              | `ContentNotFound` |

use super::indicators::Vocabulary;
use crate::error::{AcquireError, AcquireResult};
use crate::renderer::RenderedSession;

/// Regions at or under this many characters are never candidates.
pub const MIN_CANDIDATE_LENGTH: usize = 1000;

/// Known content containers on the portal.
pub const SPECIFIC_DESCRIPTORS: &[&str] = &[
    ".documento-conteudo",
    ".normativo-conteudo",
    ".conteudo-documento",
    ".document-content",
    "#conteudo",
    "div[class*=\"conteudo\"]",
    "div[class*=\"documento\"]",
    "div[class*=\"normativo\"]",
    "div[class*=\"texto\"]",
];

/// Generic layout containers.
pub const GENERIC_DESCRIPTORS: &[&str] = &[
    ".main-content",
    "main",
    "article",
    "div[class*=\"content\"]",
    "div[class*=\"main\"]",
    ".container .row",
    ".row .col-md-12",
    ".row .col-lg-12",
];

/// Whole-document fallback.
pub const BODY_DESCRIPTOR: &str = "body";

/// Default priority list: specific, then generic, then body.
pub fn default_descriptors() -> Vec<String> {
    SPECIFIC_DESCRIPTORS
        .iter()
        .chain(GENERIC_DESCRIPTORS)
        .chain(std::iter::once(&BODY_DESCRIPTOR))
        .map(|s| s.to_string())
        .collect()
}

/// One scored region.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentCandidate {
    pub selector_id: String,
    pub text: String,
    pub score: f64,
}

/// The chosen candidate and how it was accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub candidate: ContentCandidate,
    /// Accepted on length alone.
    pub degraded: bool,
    /// Number of regions that passed the length floor.
    pub evaluated: usize,
}

/// Scores regions and picks the content container.
#[derive(Debug, Clone)]
pub struct ContentSelector {
    descriptors: Vec<String>,
    vocabulary: Vocabulary,
    degraded_acceptance: bool,
}

impl Default for ContentSelector {
    fn default() -> Self {
        Self::new(default_descriptors(), Vocabulary::default(), false)
    }
}

impl ContentSelector {
    pub fn new(descriptors: Vec<String>, vocabulary: Vocabulary, degraded_acceptance: bool) -> Self {
        Self {
            descriptors,
            vocabulary,
            degraded_acceptance,
        }
    }

    pub fn with_degraded_acceptance(mut self, enabled: bool) -> Self {
        self.degraded_acceptance = enabled;
        self
    }

    pub fn descriptors(&self) -> &[String] {
        &self.descriptors
    }

    /// Collect regions from the session in priority order and select.
    pub async fn select(&self, session: &dyn RenderedSession) -> AcquireResult<Selection> {
        let mut regions = Vec::new();
        for descriptor in &self.descriptors {
            for region in session.find_regions(descriptor).await? {
                regions.push((descriptor.clone(), region.text().to_string()));
            }
        }
        self.select_from(regions)
    }

    /// Pure selection over `(descriptor, text)` pairs already in priority order.
    pub fn select_from<I>(&self, regions: I) -> AcquireResult<Selection>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut best: Option<ContentCandidate> = None;
        let mut evaluated = 0;

        for (selector_id, text) in regions {
            if text.chars().count() <= MIN_CANDIDATE_LENGTH {
                continue;
            }
            evaluated += 1;
            let score = self.vocabulary.scan(&text).score();
            // Strictly greater: earlier descriptors keep ties
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ContentCandidate {
                    selector_id,
                    text,
                    score,
                });
            }
        }

        let Some(candidate) = best else {
            return Err(AcquireError::ContentNotFound(format!(
                "no region longer than {MIN_CANDIDATE_LENGTH} characters"
            )));
        };

        if candidate.score > 0.0 {
            tracing::info!(
                selector = %candidate.selector_id,
                score = candidate.score,
                "content region selected"
            );
            return Ok(Selection {
                candidate,
                degraded: false,
                evaluated,
            });
        }

        if self.degraded_acceptance {
            tracing::warn!(
                selector = %candidate.selector_id,
                score = candidate.score,
                "no region scored positively; accepting on length alone"
            );
            return Ok(Selection {
                candidate,
                degraded: true,
                evaluated,
            });
        }

        Err(AcquireError::ContentNotFound(format!(
            "best region {} scored {}",
            candidate.selector_id, candidate.score
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(prefix: &str) -> String {
        format!("{prefix} {}", "texto corrido sem marcadores ".repeat(50))
    }

    fn pairs(items: &[(&str, String)]) -> Vec<(String, String)> {
        items.iter().map(|(s, t)| (s.to_string(), t.clone())).collect()
    }

    #[test]
    fn test_specific_container_beats_body() {
        let selector = ContentSelector::default();
        let selection = selector
            .select_from(pairs(&[
                (".documento-conteudo", pad("RESOLUÇÃO Art. 1º Considerando")),
                ("body", pad("RESOLUÇÃO ACESSIBILIDADE Art. 1º Considerando ENGLISH Home Estabilidade")),
            ]))
            .unwrap();
        assert_eq!(selection.candidate.selector_id, ".documento-conteudo");
        assert_eq!(selection.candidate.score, 3.0);
        assert!(!selection.degraded);
        assert_eq!(selection.evaluated, 2);
    }

    #[test]
    fn test_tie_goes_to_earlier_descriptor() {
        let selector = ContentSelector::default();
        let text = pad("RESOLUÇÃO Art. 1º");
        for _ in 0..3 {
            let selection = selector
                .select_from(pairs(&[("main", text.clone()), ("body", text.clone())]))
                .unwrap();
            assert_eq!(selection.candidate.selector_id, "main");
        }
    }

    #[test]
    fn test_later_higher_score_wins() {
        let selector = ContentSelector::default();
        let selection = selector
            .select_from(pairs(&[
                ("main", pad("RESOLUÇÃO")),
                ("body", pad("RESOLUÇÃO Art. 1º Considerando Visto")),
            ]))
            .unwrap();
        assert_eq!(selection.candidate.selector_id, "body");
        assert_eq!(selection.candidate.score, 4.0);
    }

    #[test]
    fn test_short_regions_are_ignored() {
        let selector = ContentSelector::default();
        let err = selector
            .select_from(pairs(&[("main", "RESOLUÇÃO Art. 1º".to_string())]))
            .unwrap_err();
        assert!(matches!(err, AcquireError::ContentNotFound(_)));
    }

    #[test]
    fn test_zero_score_rejected_when_strict() {
        let selector = ContentSelector::default();
        let err = selector
            .select_from(pairs(&[("main", pad("ACESSIBILIDADE"))]))
            .unwrap_err();
        assert!(matches!(err, AcquireError::ContentNotFound(_)));
    }

    #[test]
    fn test_degraded_acceptance_takes_long_candidate() {
        let selector = ContentSelector::default().with_degraded_acceptance(true);
        let selection = selector
            .select_from(pairs(&[("main", pad("ACESSIBILIDADE")), ("body", pad("ENGLISH Home"))]))
            .unwrap();
        assert!(selection.degraded);
        assert_eq!(selection.candidate.selector_id, "main");
        assert_eq!(selection.candidate.score, -0.5);
    }

    #[test]
    fn test_default_descriptor_order() {
        let descriptors = default_descriptors();
        assert_eq!(descriptors.first().map(String::as_str), Some(".documento-conteudo"));
        assert_eq!(descriptors.last().map(String::as_str), Some("body"));
    }
}
