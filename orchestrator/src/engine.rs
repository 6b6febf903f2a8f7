//! Workflow execution engine
//!
//! Drives a drafting session through every stage with:
//! - Human-in-loop checkpoints after briefing, debate and polish
//! - Stage retries and aborts decided at checkpoints
//! - Optional timeout on checkpoint decisions

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::agent_config::RoleRegistry;
use crate::checkpoint::{
    AutoApproveCheckpointHandler, Checkpoint, CheckpointHandler, Decision,
    InteractiveCheckpointHandler,
};
use crate::config::EngineConfig;
use crate::error::{DraftError, DraftResult};
use crate::request::SpeechRequest;
use crate::session::{DraftingSession, SessionReport, SessionStatus};

/// A stage error raised while driving a session
///
/// Carries the report of the session as it stood after its last committed
/// stage, so history is never lost with the error.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SessionFailure {
    #[source]
    pub error: DraftError,
    pub report: SessionReport,
}

/// Workflow execution engine
pub struct WorkflowEngine {
    /// Shared role registry
    registry: Arc<RoleRegistry>,

    /// Engine configuration
    config: EngineConfig,

    /// Checkpoint handler
    checkpoint_handler: Box<dyn CheckpointHandler>,
}

impl WorkflowEngine {
    /// Create a new workflow engine
    pub fn new(registry: Arc<RoleRegistry>, config: EngineConfig) -> Self {
        let checkpoint_handler: Box<dyn CheckpointHandler> = if config.non_interactive {
            Box::new(AutoApproveCheckpointHandler)
        } else {
            Box::new(InteractiveCheckpointHandler)
        };

        Self {
            registry,
            config,
            checkpoint_handler,
        }
    }

    /// Set a custom checkpoint handler
    pub fn with_checkpoint_handler(mut self, handler: Box<dyn CheckpointHandler>) -> Self {
        self.checkpoint_handler = handler;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    /// Start a session configured like this engine
    pub fn start(&self, request: SpeechRequest) -> DraftResult<DraftingSession> {
        Ok(DraftingSession::new(request, Arc::clone(&self.registry))?
            .with_sequencing(self.config.sequencing)
            .with_max_retries(self.config.max_stage_retries))
    }

    /// Run a fresh session for `request` to completion or abort
    pub async fn run(&self, request: SpeechRequest) -> Result<SessionReport, SessionFailure> {
        let mut session = self.start(request).map_err(|error| SessionFailure {
            error,
            report: SessionReport::empty(),
        })?;
        self.drive(&mut session).await
    }

    /// Drive an existing session from wherever it stands
    ///
    /// A checkpoint left undecided by an earlier run is presented again
    /// before any later stage runs. Returns once the terminal stage is
    /// committed or a checkpoint aborts. On a stage error the session keeps
    /// its last committed state and the failure carries its report.
    pub async fn drive(
        &self,
        session: &mut DraftingSession,
    ) -> Result<SessionReport, SessionFailure> {
        match self.advance(session).await {
            Ok(()) => Ok(session.report()),
            Err(error) => {
                tracing::warn!(stage = %session.stage(), "Workflow stopped: {}", error);
                Err(SessionFailure {
                    error,
                    report: session.report(),
                })
            }
        }
    }

    async fn advance(&self, session: &mut DraftingSession) -> DraftResult<()> {
        tracing::info!(
            occasion = %session.request().occasion,
            stage = %session.stage(),
            "Workflow started"
        );

        loop {
            if matches!(session.status(), SessionStatus::Aborted(_)) {
                return Ok(());
            }
            if let Some(checkpoint) = session.pending_checkpoint() {
                self.settle(session, checkpoint).await?;
                continue;
            }
            let Some(stage) = session.stage().next() else {
                break;
            };
            session.run_stage(stage).await?;
        }

        tracing::info!(history = session.history().len(), "Workflow completed");
        Ok(())
    }

    /// Apply decisions to `checkpoint` until it is approved or the session aborts
    async fn settle(
        &self,
        session: &mut DraftingSession,
        mut checkpoint: Checkpoint,
    ) -> DraftResult<()> {
        loop {
            match self.await_decision(&checkpoint).await {
                Decision::Resume => {
                    session.resume();
                    return Ok(());
                }
                Decision::Abort(reason) => {
                    let reason =
                        reason.unwrap_or_else(|| format!("rejected at {}", checkpoint.stage));
                    session.abort(reason);
                    return Ok(());
                }
                Decision::RetryStage => match session.retry_stage().await {
                    Ok(_) => match session.pending_checkpoint() {
                        Some(next) => checkpoint = next,
                        None => return Ok(()),
                    },
                    Err(e @ DraftError::RetryLimitExceeded { .. }) => {
                        session.abort(e.to_string());
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                },
            }
        }
    }

    async fn await_decision(&self, checkpoint: &Checkpoint) -> Decision {
        await_decision(
            self.checkpoint_handler.as_ref(),
            checkpoint,
            self.config.checkpoint_timeout(),
        )
        .await
    }
}

/// Ask `handler` for a decision, treating timeout expiry as an abort
pub async fn await_decision(
    handler: &dyn CheckpointHandler,
    checkpoint: &Checkpoint,
    timeout: Option<Duration>,
) -> Decision {
    let Some(limit) = timeout else {
        return handler.decide(checkpoint).await;
    };

    match tokio::time::timeout(limit, handler.decide(checkpoint)).await {
        Ok(decision) => decision,
        Err(_) => {
            tracing::warn!(stage = %checkpoint.stage, "Checkpoint decision timed out");
            Decision::Abort(Some(format!("checkpoint timed out after {:?}", limit)))
        }
    }
}
