//! Keyword Template Matcher Adapter
//!
//! Scores each candidate template by the share of its keywords found in the
//! utterance. A lightweight stand-in for the embedding-based matcher.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::domain::foundation::DdtId;
use crate::ports::{TemplateMatch, TemplateMatcher};

/// Keyword-overlap matcher.
#[derive(Debug, Clone)]
pub struct KeywordTemplateMatcher {
    keywords: HashMap<DdtId, Vec<String>>,
    min_score: f32,
}

impl Default for KeywordTemplateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordTemplateMatcher {
    pub fn new() -> Self {
        Self {
            keywords: HashMap::new(),
            min_score: 0.0,
        }
    }

    /// Registers the keywords of a template. Matching is case-insensitive.
    pub fn with_template<S: AsRef<str>>(
        mut self,
        id: DdtId,
        keywords: impl IntoIterator<Item = S>,
    ) -> Self {
        self.keywords.insert(
            id,
            keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        );
        self
    }

    /// Scores at or below this are not a match.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    fn score(&self, words: &HashSet<String>, id: &DdtId) -> f32 {
        match self.keywords.get(id) {
            Some(keywords) if !keywords.is_empty() => {
                let hits = keywords.iter().filter(|k| words.contains(*k)).count();
                hits as f32 / keywords.len() as f32
            }
            _ => 0.0,
        }
    }
}

#[async_trait]
impl TemplateMatcher for KeywordTemplateMatcher {
    async fn match_template(&self, utterance: &str, candidates: &[DdtId]) -> Option<TemplateMatch> {
        let words: HashSet<String> = utterance
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut best: Option<TemplateMatch> = None;
        for id in candidates {
            let score = self.score(&words, id);
            if score <= self.min_score {
                continue;
            }
            let better = match &best {
                Some(current) => {
                    score > current.score
                        || (score == current.score && id < &current.template_id)
                }
                None => true,
            };
            if better {
                best = Some(TemplateMatch {
                    template_id: id.clone(),
                    score,
                });
            }
        }
        tracing::debug!(
            matched = ?best.as_ref().map(|m| m.template_id.as_str()),
            candidates = candidates.len(),
            "Template matching"
        );
        best
    }
}
