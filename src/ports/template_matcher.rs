//! Template Matcher Port - Picks a DDT for an opening utterance.
//!
//! Scoring is the collaborator's business; the core only reads the winning
//! template id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DdtId;

/// Port for utterance-to-template matching.
#[async_trait]
pub trait TemplateMatcher: Send + Sync {
    /// Best match among `candidates`, or `None` when nothing fits.
    async fn match_template(&self, utterance: &str, candidates: &[DdtId]) -> Option<TemplateMatch>;
}

/// A matched template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMatch {
    pub template_id: DdtId,
    pub score: f32,
}
