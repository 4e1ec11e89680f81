use std::collections::HashSet;
use tracing::debug;

use crate::models::CandidateArticle;
use crate::text::{overlap_ratio, title_tokens};

pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.70;

/// Drops candidates whose title repeats an earlier one.
///
/// A title is a duplicate when its token overlap with any already accepted
/// title reaches the threshold. Acceptance is first-come, so feed order
/// decides which copy survives. Titles with no tokens never match anything
/// and are always kept.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn dedupe(&self, candidates: Vec<CandidateArticle>) -> Vec<CandidateArticle> {
        let mut accepted: Vec<HashSet<String>> = Vec::with_capacity(candidates.len());
        let mut kept = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let tokens = title_tokens(&candidate.title);
            let duplicate = accepted
                .iter()
                .any(|seen| overlap_ratio(&tokens, seen) >= self.threshold);

            if duplicate {
                debug!("Dropping duplicate title: {}", candidate.title);
                continue;
            }

            accepted.push(tokens);
            kept.push(candidate);
        }

        kept
    }
}
