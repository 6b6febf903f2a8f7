//! A single drafting session
//!
//! The session owns the request, the current draft and the append-only
//! history. Each stage operation computes a new draft from the current one,
//! records it, and either suspends at a checkpoint or (for the terminal
//! stage) returns the draft.
//!
//! A failed stage leaves the session exactly as it was.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::agent_config::RoleRegistry;
use crate::checkpoint::{Checkpoint, StageOutcome};
use crate::draft::{Contributions, Draft, DraftSnapshot};
use crate::error::{DraftError, DraftResult};
use crate::request::SpeechRequest;
use crate::role::Role;
use crate::workflow::{speaker_notes, SequencingMode, Stage};

/// Default number of retries allowed per stage
pub const DEFAULT_MAX_STAGE_RETRIES: u32 = 3;

/// Lifecycle status of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Stages remain to be run
    Active,
    /// The terminal stage has been committed
    Completed,
    /// Stopped at a checkpoint; history is kept
    Aborted(String),
}

/// Serializable session state
///
/// Everything a session needs to continue after a restart, except the
/// registry, which the owner supplies again on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub request: SpeechRequest,
    pub stage: Stage,
    pub current: Draft,
    /// Draft the latest stage was computed from
    pub base: Draft,
    pub history: Vec<DraftSnapshot>,
    pub attempts: u32,
    #[serde(default)]
    pub aborted: Option<String>,
    /// The latest stage suspended and no decision has been applied yet
    #[serde(default)]
    pub awaiting_decision: bool,
    #[serde(default)]
    pub sequencing: SequencingMode,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_STAGE_RETRIES
}

impl SessionState {
    pub fn to_json(&self) -> DraftResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> DraftResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Final result handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub status: SessionStatus,
    pub final_draft: Draft,
    pub history: Vec<DraftSnapshot>,
}

impl SessionReport {
    /// Report for a session that never started
    pub fn empty() -> Self {
        Self {
            status: SessionStatus::Active,
            final_draft: Draft::new(),
            history: Vec::new(),
        }
    }
}

/// One drafting session from an empty draft to speaker notes
pub struct DraftingSession {
    request: Arc<SpeechRequest>,
    registry: Arc<RoleRegistry>,
    sequencing: SequencingMode,
    max_retries: u32,
    stage: Stage,
    current: Draft,
    base: Draft,
    history: Vec<DraftSnapshot>,
    attempts: u32,
    aborted: Option<String>,
    awaiting_decision: bool,
}

impl DraftingSession {
    /// Start a session with an empty draft
    pub fn new(request: SpeechRequest, registry: Arc<RoleRegistry>) -> DraftResult<Self> {
        request.validate()?;
        Ok(Self {
            request: Arc::new(request),
            registry,
            sequencing: SequencingMode::default(),
            max_retries: DEFAULT_MAX_STAGE_RETRIES,
            stage: Stage::Initial,
            current: Draft::new(),
            base: Draft::new(),
            history: Vec::new(),
            attempts: 0,
            aborted: None,
            awaiting_decision: false,
        })
    }

    /// Set the sequencing mode
    pub fn with_sequencing(mut self, sequencing: SequencingMode) -> Self {
        self.sequencing = sequencing;
        self
    }

    /// Set how often a stage may be retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Rebuild a session from saved state
    pub fn restore(state: SessionState, registry: Arc<RoleRegistry>) -> Self {
        Self {
            request: Arc::new(state.request),
            registry,
            sequencing: state.sequencing,
            max_retries: state.max_retries,
            stage: state.stage,
            current: state.current,
            base: state.base,
            history: state.history,
            attempts: state.attempts,
            aborted: state.aborted,
            awaiting_decision: state.awaiting_decision,
        }
    }

    /// Snapshot the session for persistence
    pub fn state(&self) -> SessionState {
        SessionState {
            request: self.request.as_ref().clone(),
            stage: self.stage,
            current: self.current.clone(),
            base: self.base.clone(),
            history: self.history.clone(),
            attempts: self.attempts,
            aborted: self.aborted.clone(),
            awaiting_decision: self.awaiting_decision,
            sequencing: self.sequencing,
            max_retries: self.max_retries,
        }
    }

    pub fn request(&self) -> &SpeechRequest {
        &self.request
    }

    /// Last committed stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn current(&self) -> &Draft {
        &self.current
    }

    /// Committed drafts, oldest first
    pub fn history(&self) -> &[DraftSnapshot] {
        &self.history
    }

    pub fn sequencing(&self) -> SequencingMode {
        self.sequencing
    }

    pub fn status(&self) -> SessionStatus {
        match &self.aborted {
            Some(reason) => SessionStatus::Aborted(reason.clone()),
            None if self.stage.is_terminal() => SessionStatus::Completed,
            None => SessionStatus::Active,
        }
    }

    /// Checkpoint of the latest stage if it still awaits a decision
    ///
    /// Running the next stage operation directly counts as a resume.
    pub fn pending_checkpoint(&self) -> Option<Checkpoint> {
        if !self.awaiting_decision || self.aborted.is_some() {
            return None;
        }
        let reason = self.stage.checkpoint_reason()?;
        Some(Checkpoint::new(self.stage, reason, self.current.clone()))
    }

    /// Record an approval of the pending checkpoint
    pub fn resume(&mut self) {
        if self.awaiting_decision {
            tracing::info!(stage = %self.stage, "Checkpoint approved");
            self.awaiting_decision = false;
        }
    }

    /// Create the initial outline from policy, data and logic roles
    pub async fn initial_briefing(&mut self) -> DraftResult<StageOutcome> {
        self.run_stage(Stage::Briefed).await
    }

    /// Collect critiques and revisions from every role
    pub async fn debate_round(&mut self) -> DraftResult<StageOutcome> {
        self.run_stage(Stage::Debated).await
    }

    /// Apply stylistic polish and run the risk review
    pub async fn polish_and_risk_check(&mut self) -> DraftResult<StageOutcome> {
        self.run_stage(Stage::Polished).await
    }

    /// Attach speaker notes and return the final draft
    pub async fn generate_speaker_notes(&mut self) -> DraftResult<Draft> {
        let outcome = self.run_stage(Stage::Noted).await?;
        Ok(outcome.draft().clone())
    }

    /// Run the operation that produces `stage`
    pub async fn run_stage(&mut self, stage: Stage) -> DraftResult<StageOutcome> {
        self.ensure_runnable(stage)?;

        tracing::info!(stage = %stage, "Running stage {}", stage.operation());
        let base = self.current.clone();
        let draft = self.compute(stage, &base).await?;
        self.commit(stage, 1, base, draft.clone());

        Ok(self.outcome(stage, draft))
    }

    /// Recompute the latest stage from the draft it was run against
    ///
    /// The earlier attempt stays in history.
    pub async fn retry_stage(&mut self) -> DraftResult<StageOutcome> {
        self.ensure_not_aborted()?;

        let stage = self.stage;
        if stage == Stage::Initial || stage.is_terminal() {
            return Err(DraftError::StageSequence {
                attempted: stage,
                current: stage,
            });
        }
        if self.attempts > self.max_retries {
            return Err(DraftError::RetryLimitExceeded {
                stage,
                limit: self.max_retries,
            });
        }

        let attempt = self.attempts + 1;
        tracing::info!(stage = %stage, attempt, "Retrying stage");
        let base = self.base.clone();
        let draft = self.compute(stage, &base).await?;
        self.commit(stage, attempt, base, draft.clone());

        Ok(self.outcome(stage, draft))
    }

    /// Stop the session; later stage operations fail with `SessionAborted`
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.aborted.is_none() {
            let reason = reason.into();
            tracing::warn!(stage = %self.stage, "Session aborted: {}", reason);
            self.aborted = Some(reason);
        }
    }

    /// Consume the session into its report
    pub fn into_report(self) -> SessionReport {
        SessionReport {
            status: self.status(),
            final_draft: self.current,
            history: self.history,
        }
    }

    /// Report without consuming the session
    pub fn report(&self) -> SessionReport {
        SessionReport {
            status: self.status(),
            final_draft: self.current.clone(),
            history: self.history.clone(),
        }
    }

    fn ensure_not_aborted(&self) -> DraftResult<()> {
        match &self.aborted {
            Some(reason) => Err(DraftError::SessionAborted(reason.clone())),
            None => Ok(()),
        }
    }

    fn ensure_runnable(&self, stage: Stage) -> DraftResult<()> {
        self.ensure_not_aborted()?;

        let in_order = stage.predecessor() == Some(self.stage);
        let allowed = match self.sequencing {
            SequencingMode::Strict => in_order,
            SequencingMode::Permissive => stage != Stage::Initial,
        };

        if allowed {
            Ok(())
        } else {
            Err(DraftError::StageSequence {
                attempted: stage,
                current: self.stage,
            })
        }
    }

    async fn compute(&self, stage: Stage, base: &Draft) -> DraftResult<Draft> {
        match stage {
            Stage::Briefed | Stage::Debated => {
                let contributions = self.collect(stage.roles(), base).await?;
                Ok(base.merge(&contributions))
            }
            Stage::Polished => {
                let contributions = self.collect(stage.roles(), base).await?;
                let stylist = contributions.get(Role::Stylist).unwrap_or_default();
                let risk = contributions.get(Role::RiskReviewer).unwrap_or_default();
                Ok(base.append_blocks(&[("Stylist", stylist), ("Risk", risk)]))
            }
            Stage::Noted => Ok(base.with_notes(speaker_notes())),
            Stage::Initial => Err(DraftError::StageSequence {
                attempted: stage,
                current: self.stage,
            }),
        }
    }

    /// Invoke `roles` concurrently against the same draft
    async fn collect(&self, roles: &[Role], draft: &Draft) -> DraftResult<Contributions> {
        let contributors = roles
            .iter()
            .map(|role| self.registry.resolve(*role).map(|c| (*role, c)))
            .collect::<DraftResult<Vec<_>>>()?;

        let request = self.request.as_ref();
        let calls = contributors.iter().map(|(role, contributor)| async move {
            tracing::debug!(role = %role, "Invoking contributor");
            match contributor.generate(request, draft).await {
                Ok(text) => Ok((*role, text)),
                Err(e) => {
                    tracing::warn!(role = %role, "Contributor failed: {:#}", e);
                    Err(DraftError::ContributorFailure {
                        role: *role,
                        message: format!("{:#}", e),
                    })
                }
            }
        });

        let results = try_join_all(calls).await?;
        Ok(results.into_iter().collect())
    }

    fn commit(&mut self, stage: Stage, attempt: u32, base: Draft, draft: Draft) {
        tracing::info!(
            stage = %stage,
            attempt,
            text_len = draft.text.len(),
            "Stage committed"
        );
        self.history
            .push(DraftSnapshot::new(stage, attempt, draft.clone()));
        self.stage = stage;
        self.attempts = attempt;
        self.base = base;
        self.current = draft;
        self.awaiting_decision = stage.checkpoint_reason().is_some();
    }

    fn outcome(&self, stage: Stage, draft: Draft) -> StageOutcome {
        match stage.checkpoint_reason() {
            Some(reason) => {
                tracing::info!(stage = %stage, "Checkpoint: {}", reason);
                StageOutcome::Suspended(Checkpoint::new(stage, reason, draft))
            }
            None => StageOutcome::Committed(draft),
        }
    }
}

impl std::fmt::Debug for DraftingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftingSession")
            .field("stage", &self.stage)
            .field("sequencing", &self.sequencing)
            .field("history_len", &self.history.len())
            .field("aborted", &self.aborted)
            .field("awaiting_decision", &self.awaiting_decision)
            .finish_non_exhaustive()
    }
}
