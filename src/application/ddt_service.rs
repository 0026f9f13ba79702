//! DdtService - Publishes DDTs and opens dialogue sessions on them.
//!
//! Publication runs assemble -> validate -> persist and caches the result as
//! an `Arc<ValidatedDdt>`. Sessions share that `Arc`; republishing a DDT
//! swaps the cache entry and leaves running sessions on the version they
//! started with.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::assembler::{disassemble, AssemblyRequest, DdtAssembler};
use crate::domain::ddt::{validate, Ddt, ValidatedDdt};
use crate::domain::foundation::{DdtId, DomainError, ErrorCode, IdSource, RandomIds};
use crate::domain::runtime::{DialogueEngine, EngineConfig, RuntimeError, SessionState, Turn};
use crate::ports::{DdtRepository, InputParser, TemplateMatcher};

/// A running session: the engine bound to one DDT version plus its state.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    pub engine: DialogueEngine,
    pub state: SessionState,
}

impl DialogueSession {
    /// Sends one user turn.
    pub async fn reply(&mut self, input: &str) -> Result<Turn, RuntimeError> {
        self.engine.advance(&mut self.state, input).await
    }

    /// Returns true once the session left the DDT's nodes.
    pub fn is_finished(&self) -> bool {
        self.engine.is_terminal(&self.state.current_node_id)
    }
}

/// Application service over DDT publication and sessions.
pub struct DdtService {
    repository: Arc<dyn DdtRepository>,
    parser: Arc<dyn InputParser>,
    matcher: Option<Arc<dyn TemplateMatcher>>,
    assembler: DdtAssembler,
    engine_config: EngineConfig,
    cache: RwLock<HashMap<DdtId, Arc<ValidatedDdt>>>,
}

impl DdtService {
    pub fn new(
        repository: Arc<dyn DdtRepository>,
        parser: Arc<dyn InputParser>,
        assembler: DdtAssembler,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            parser,
            matcher: None,
            assembler,
            engine_config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn TemplateMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Assembles, validates, stores and caches a DDT with random ids.
    pub async fn publish(&self, request: AssemblyRequest) -> Result<Arc<ValidatedDdt>, DomainError> {
        self.publish_with(request, &mut RandomIds).await
    }

    /// Same as [`publish`](Self::publish) with a caller-chosen id source.
    pub async fn publish_with(
        &self,
        request: AssemblyRequest,
        ids: &mut (dyn IdSource + Send),
    ) -> Result<Arc<ValidatedDdt>, DomainError> {
        let ddt = self.assembler.assemble(request, ids)?;
        self.import(ddt).await
    }

    /// Validates, stores and caches an already assembled DDT.
    pub async fn import(&self, ddt: Ddt) -> Result<Arc<ValidatedDdt>, DomainError> {
        let validated = Arc::new(validate(ddt)?);
        self.repository.save(&validated).await?;
        self.cache
            .write()
            .await
            .insert(validated.id.clone(), validated.clone());
        tracing::info!(ddt_id = %validated.id, nodes = validated.node_ids().len(), "DDT published");
        Ok(validated)
    }

    /// Re-publishes a stored DDT after editing its raw form.
    pub async fn patch<F>(&self, id: &DdtId, edit: F) -> Result<Arc<ValidatedDdt>, DomainError>
    where
        F: FnOnce(&mut AssemblyRequest) + Send,
    {
        let current = self.get(id).await?;
        let mut request = disassemble(&current).map_err(|err| {
            DomainError::new(ErrorCode::MissingTranslation, err.to_string())
                .with_detail("ddt_id", id.to_string())
        })?;
        edit(&mut request);
        request.ddt_id = Some(id.to_string());
        self.publish(request).await
    }

    /// Returns the cached DDT, loading and validating it on a miss.
    pub async fn get(&self, id: &DdtId) -> Result<Arc<ValidatedDdt>, DomainError> {
        if let Some(ddt) = self.cache.read().await.get(id) {
            return Ok(ddt.clone());
        }

        let ddt = self.repository.load(id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::DdtNotFound, format!("DDT '{}' not found", id))
        })?;
        let validated = Arc::new(validate(ddt)?);
        self.cache
            .write()
            .await
            .insert(id.clone(), validated.clone());
        Ok(validated)
    }

    /// Ids of all stored DDTs.
    pub async fn list(&self) -> Result<Vec<DdtId>, DomainError> {
        Ok(self.repository.list().await?)
    }

    /// Opens a session on a DDT and emits its opening prompt.
    pub async fn open_session(&self, id: &DdtId) -> Result<DialogueSession, DomainError> {
        let ddt = self.get(id).await?;
        let engine = DialogueEngine::new(ddt, self.parser.clone(), self.engine_config.clone());
        let state = engine.start()?;
        Ok(DialogueSession { engine, state })
    }

    /// Picks a DDT for an opening utterance and opens a session on it.
    pub async fn open_session_for_utterance(
        &self,
        utterance: &str,
    ) -> Result<DialogueSession, DomainError> {
        let matcher = self.matcher.as_ref().ok_or_else(|| {
            DomainError::new(ErrorCode::TemplateNotMatched, "No template matcher configured")
        })?;
        let candidates = self.list().await?;
        let found = matcher
            .match_template(utterance, &candidates)
            .await
            .ok_or_else(|| {
                DomainError::new(ErrorCode::TemplateNotMatched, "No template matches the utterance")
                    .with_detail("utterance", utterance)
            })?;
        tracing::debug!(ddt_id = %found.template_id, score = found.score, "Template matched");
        self.open_session(&found.template_id).await
    }
}
