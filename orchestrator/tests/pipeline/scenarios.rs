//! End-to-end runs through the engine

use std::sync::Arc;

use speech_orchestrator::checkpoint::ScriptedCheckpointHandler;
use speech_orchestrator::workflow::SPEAKER_NOTES;
use speech_orchestrator::{
    Decision, DraftError, DraftingSession, EngineConfig, FnContributor, Role, SessionState,
    SessionStatus, Stage, WorkflowEngine,
};

use crate::support::{fixed_registry, request};

fn engine(decisions: Vec<Decision>) -> (WorkflowEngine, Arc<ScriptedCheckpointHandler>) {
    let handler = Arc::new(ScriptedCheckpointHandler::new(decisions));
    let engine = WorkflowEngine::new(Arc::new(fixed_registry()), EngineConfig::default())
        .with_checkpoint_handler(Box::new(SharedHandler(Arc::clone(&handler))));
    (engine, handler)
}

struct SharedHandler(Arc<ScriptedCheckpointHandler>);

#[async_trait::async_trait]
impl speech_orchestrator::CheckpointHandler for SharedHandler {
    async fn decide(&self, checkpoint: &speech_orchestrator::Checkpoint) -> Decision {
        self.0.decide(checkpoint).await
    }
}

#[tokio::test]
async fn test_engine_completes_with_notes() {
    let (engine, handler) = engine(vec![]);
    let report = engine.run(request()).await.unwrap();

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.history.len(), 4);
    assert_eq!(report.final_draft.notes, SPEAKER_NOTES.to_vec());

    let stages: Vec<_> = handler.seen().iter().map(|c| c.stage).collect();
    assert_eq!(stages, vec![Stage::Briefed, Stage::Debated, Stage::Polished]);
}

#[tokio::test]
async fn test_engine_abort_at_debate_keeps_history() {
    let (engine, _) = engine(vec![
        Decision::Resume,
        Decision::Abort(Some("needs a new angle".to_string())),
    ]);
    let report = engine.run(request()).await.unwrap();

    assert_eq!(
        report.status,
        SessionStatus::Aborted("needs a new angle".to_string())
    );
    assert_eq!(report.history.len(), 2);
    assert!(report.final_draft.notes.is_empty());
}

#[tokio::test]
async fn test_engine_retry_appends_snapshot() {
    let (engine, _) = engine(vec![Decision::RetryStage, Decision::Resume]);
    let report = engine.run(request()).await.unwrap();

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.history.len(), 5);
    assert_eq!(report.history[0].draft, report.history[1].draft);
    assert_eq!(report.history[1].attempt, 2);
    assert_eq!(report.final_draft.text, "p\nd\nl\np\nd\nl\ns\nr\n\n[Stylist]\ns\n\n[Risk]\nr");
}

#[tokio::test]
async fn test_engine_resumes_persisted_session() {
    let registry = Arc::new(fixed_registry());
    let mut session = DraftingSession::new(request(), Arc::clone(&registry)).unwrap();
    session.initial_briefing().await.unwrap();
    session.debate_round().await.unwrap();

    let saved = session.state().to_json().unwrap();
    let mut restored = DraftingSession::restore(SessionState::from_json(&saved).unwrap(), registry);

    let (engine, handler) = engine(vec![]);
    let report = engine.drive(&mut restored).await.unwrap();

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.history.len(), 4);
    let stages: Vec<_> = handler.seen().iter().map(|c| c.stage).collect();
    assert_eq!(stages, vec![Stage::Debated, Stage::Polished]);
}

#[tokio::test]
async fn test_undecided_checkpoint_is_decided_before_next_stage() {
    let registry = Arc::new(fixed_registry());
    let mut session = DraftingSession::new(request(), Arc::clone(&registry)).unwrap();
    session.initial_briefing().await.unwrap();

    let saved = session.state().to_json().unwrap();
    let mut restored = DraftingSession::restore(SessionState::from_json(&saved).unwrap(), registry);

    let (engine, handler) = engine(vec![Decision::Abort(Some("outline rejected".to_string()))]);
    let report = engine.drive(&mut restored).await.unwrap();

    assert_eq!(
        report.status,
        SessionStatus::Aborted("outline rejected".to_string())
    );
    let stages: Vec<_> = report.history.iter().map(|s| s.stage).collect();
    assert_eq!(stages, vec![Stage::Briefed]);

    let seen = handler.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].stage, Stage::Briefed);
    assert_eq!(seen[0].draft.text, "p\nd\nl");
}

#[tokio::test]
async fn test_contributor_failure_during_debate_keeps_history() {
    let registry = fixed_registry().with_contributor(
        Role::RiskReviewer,
        FnContributor::failing("rate limited"),
    );
    let engine = WorkflowEngine::new(Arc::new(registry), EngineConfig::default())
        .with_checkpoint_handler(Box::new(ScriptedCheckpointHandler::default()));

    let failure = engine.run(request()).await.unwrap_err();

    assert!(matches!(
        failure.error,
        DraftError::ContributorFailure { role: Role::RiskReviewer, ref message } if message == "rate limited"
    ));
    assert_eq!(failure.report.status, SessionStatus::Active);
    assert_eq!(failure.report.history.len(), 1);
    assert_eq!(failure.report.history[0].stage, Stage::Briefed);
    assert_eq!(failure.report.final_draft.text, "p\nd\nl");
}

#[tokio::test]
async fn test_failed_stage_can_be_driven_again() {
    let registry = Arc::new(fixed_registry());
    let flaky = Arc::new(
        fixed_registry().with_contributor(Role::Stylist, FnContributor::failing("timeout")),
    );

    let (engine, _) = engine(vec![]);
    let mut session = DraftingSession::new(request(), Arc::clone(&flaky)).unwrap();
    session.initial_briefing().await.unwrap();
    session.resume();
    assert!(session.debate_round().await.is_err());

    let mut restored = DraftingSession::restore(session.state(), registry);
    let report = engine.drive(&mut restored).await.unwrap();
    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.history.len(), 4);
}
