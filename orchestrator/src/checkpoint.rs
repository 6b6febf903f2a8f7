//! Checkpoint handling for human-in-loop approval
//!
//! A stage that needs review returns [`StageOutcome::Suspended`]. A
//! [`CheckpointHandler`] turns the checkpoint into a [`Decision`].

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::draft::Draft;
use crate::workflow::Stage;

/// A pause point requiring an external decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Stage whose output awaits review
    pub stage: Stage,

    /// Message to display to the reviewer
    pub reason: String,

    /// Draft at the moment of suspension
    pub draft: Draft,
}

impl Checkpoint {
    /// Create a new checkpoint
    pub fn new(stage: Stage, reason: impl Into<String>, draft: Draft) -> Self {
        Self {
            stage,
            reason: reason.into(),
            draft,
        }
    }

    /// Render the checkpoint for a terminal
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("\n{}\n", "═".repeat(60)));
        out.push_str(&format!("  CHECKPOINT ({})\n", self.stage));
        out.push_str(&format!("{}\n\n", "═".repeat(60)));
        out.push_str(&self.draft.text);
        out.push_str(&format!("\n\n{}\n", "─".repeat(60)));

        if !self.draft.rationale.is_empty() {
            out.push_str("Rationale:\n");
            for (role, text) in self.draft.rationale.ordered() {
                out.push_str(&format!("  {}: {}\n", role, text));
            }
        }

        out.push_str(&format!("\n{}\n", self.reason));
        out
    }

    /// Prompt on stdin/stdout and read a decision
    ///
    /// Blocks the calling thread until a line or end of input arrives.
    pub fn prompt(&self) -> io::Result<Decision> {
        let mut stdout = io::stdout();

        println!("{}", self.render());
        println!("Options:");
        println!("  [y/yes]       - Approve and continue");
        println!("  [r/retry]     - Re-run this stage");
        println!("  [n/no REASON] - Abort the session");
        println!();

        print!("Your choice: ");
        stdout.flush()?;

        let decision = read_decision(io::stdin().lock())?;
        println!("\n{}", "═".repeat(60));
        Ok(decision)
    }
}

/// Read one decision line from `reader`
///
/// End of input aborts; an empty line approves. Unrecognised input aborts.
pub fn read_decision<R: BufRead>(mut reader: R) -> io::Result<Decision> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Ok(Decision::Abort(Some("no input".to_string())));
    }
    Ok(Decision::parse(&input))
}

/// Decision supplied at a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// Approve the stage output and go on
    Resume,
    /// Stop the session; history is kept
    Abort(Option<String>),
    /// Re-invoke the same stage's contributors
    RetryStage,
}

impl Decision {
    /// Parse free-form reviewer input
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let lowered = input.to_lowercase();
        match lowered.as_str() {
            "y" | "yes" | "" => Decision::Resume,
            "r" | "retry" => Decision::RetryStage,
            "n" | "no" => Decision::Abort(None),
            s if s.starts_with("n ") || s.starts_with("no ") => {
                let reason = input.split_once(' ').map(|(_, r)| r.trim().to_string());
                Decision::Abort(reason.filter(|r| !r.is_empty()))
            }
            _ => Decision::Abort(Some(format!("unrecognised input: {}", input))),
        }
    }
}

/// Tagged result of a non-terminal stage operation
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Stage output computed and accepted without review
    Committed(Draft),
    /// Stage output computed; a human decision is required
    Suspended(Checkpoint),
}

impl StageOutcome {
    /// The draft the stage produced
    pub fn draft(&self) -> &Draft {
        match self {
            StageOutcome::Committed(draft) => draft,
            StageOutcome::Suspended(checkpoint) => &checkpoint.draft,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, StageOutcome::Suspended(_))
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        match self {
            StageOutcome::Suspended(checkpoint) => Some(checkpoint),
            StageOutcome::Committed(_) => None,
        }
    }
}

/// Trait for checkpoint handling strategies
#[async_trait]
pub trait CheckpointHandler: Send + Sync {
    /// Decide what happens after a checkpoint
    async fn decide(&self, checkpoint: &Checkpoint) -> Decision;
}

/// Interactive checkpoint handler (default)
///
/// The prompt runs on a detached thread outside the runtime's blocking
/// pool, so an abandoned prompt does not hold up runtime shutdown.
pub struct InteractiveCheckpointHandler;

#[async_trait]
impl CheckpointHandler for InteractiveCheckpointHandler {
    async fn decide(&self, checkpoint: &Checkpoint) -> Decision {
        let checkpoint = checkpoint.clone();
        let (tx, rx) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("checkpoint-prompt".to_string())
            .spawn(move || {
                let _ = tx.send(checkpoint.prompt());
            });
        if let Err(e) = spawned {
            return Decision::Abort(Some(format!("failed to start checkpoint prompt: {}", e)));
        }

        match rx.await {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => Decision::Abort(Some(format!("failed to read decision: {}", e))),
            Err(_) => Decision::Abort(Some("checkpoint prompt exited".to_string())),
        }
    }
}

/// Auto-approve checkpoint handler (for testing/CI)
pub struct AutoApproveCheckpointHandler;

#[async_trait]
impl CheckpointHandler for AutoApproveCheckpointHandler {
    async fn decide(&self, checkpoint: &Checkpoint) -> Decision {
        tracing::info!(stage = %checkpoint.stage, "Checkpoint auto-approved: {}", checkpoint.reason);
        Decision::Resume
    }
}

/// Always abort checkpoint handler (for testing)
pub struct AbortCheckpointHandler;

#[async_trait]
impl CheckpointHandler for AbortCheckpointHandler {
    async fn decide(&self, checkpoint: &Checkpoint) -> Decision {
        Decision::Abort(Some(format!("auto-rejected at {}", checkpoint.stage)))
    }
}

/// Replays a fixed list of decisions, then resumes
#[derive(Debug, Default)]
pub struct ScriptedCheckpointHandler {
    decisions: Mutex<VecDeque<Decision>>,
    seen: Mutex<Vec<Checkpoint>>,
}

impl ScriptedCheckpointHandler {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Checkpoints presented so far, oldest first
    pub fn seen(&self) -> Vec<Checkpoint> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CheckpointHandler for ScriptedCheckpointHandler {
    async fn decide(&self, checkpoint: &Checkpoint) -> Decision {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(checkpoint.clone());
        }
        self.decisions
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(Decision::Resume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint() -> Checkpoint {
        Checkpoint::new(Stage::Briefed, "Approve outline?", Draft::new())
    }

    #[test]
    fn test_checkpoint_creation() {
        let checkpoint = checkpoint();
        assert_eq!(checkpoint.stage, Stage::Briefed);
        assert_eq!(checkpoint.reason, "Approve outline?");
        assert!(checkpoint.render().contains("CHECKPOINT (briefed)"));
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("y\n"), Decision::Resume);
        assert_eq!(Decision::parse(""), Decision::Resume);
        assert_eq!(Decision::parse("Retry"), Decision::RetryStage);
        assert_eq!(Decision::parse("n"), Decision::Abort(None));
        assert_eq!(
            Decision::parse("no Tone is Off"),
            Decision::Abort(Some("Tone is Off".to_string()))
        );
        assert!(matches!(Decision::parse("maybe"), Decision::Abort(Some(_))));
    }

    #[test]
    fn test_read_decision_end_of_input_aborts() {
        assert_eq!(
            read_decision(&b""[..]).unwrap(),
            Decision::Abort(Some("no input".to_string()))
        );
        assert_eq!(read_decision(&b"\n"[..]).unwrap(), Decision::Resume);
        assert_eq!(read_decision(&b"r\nignored\n"[..]).unwrap(), Decision::RetryStage);
    }

    #[test]
    fn test_stage_outcome_accessors() {
        let outcome = StageOutcome::Suspended(checkpoint());
        assert!(outcome.is_suspended());
        assert_eq!(outcome.checkpoint().unwrap().stage, Stage::Briefed);

        let committed = StageOutcome::Committed(Draft::new());
        assert!(!committed.is_suspended());
        assert!(committed.draft().text.is_empty());
    }

    #[tokio::test]
    async fn test_handler_auto_approve() {
        let result = AutoApproveCheckpointHandler.decide(&checkpoint()).await;
        assert_eq!(result, Decision::Resume);
    }

    #[tokio::test]
    async fn test_handler_abort() {
        let result = AbortCheckpointHandler.decide(&checkpoint()).await;
        assert!(matches!(result, Decision::Abort(Some(_))));
    }

    #[tokio::test]
    async fn test_scripted_handler() {
        let handler = ScriptedCheckpointHandler::new([Decision::RetryStage]);
        assert_eq!(handler.decide(&checkpoint()).await, Decision::RetryStage);
        assert_eq!(handler.decide(&checkpoint()).await, Decision::Resume);
        assert_eq!(handler.seen().len(), 2);
    }

    #[test]
    fn test_decision_serde() {
        let json = serde_json::to_string(&Decision::Abort(Some("late".into()))).unwrap();
        assert_eq!(json, r#"{"decision":"abort","reason":"late"}"#);
        let back: Decision = serde_json::from_str(r#"{"decision":"resume"}"#).unwrap();
        assert_eq!(back, Decision::Resume);
    }
}
