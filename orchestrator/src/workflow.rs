//! Stage definitions for the drafting pipeline
//!
//! The pipeline is fixed:
//! - Briefing (policy, data, logic) -> checkpoint
//! - Debate (all five roles) -> checkpoint
//! - Polish and risk review (stylist, risk) -> checkpoint
//! - Speaker notes (terminal, no checkpoint)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Where a session stands in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing has run yet; draft text and rationale are empty
    Initial,
    /// Initial outline from policy, data and logic roles
    Briefed,
    /// Feedback from every role appended
    Debated,
    /// Stylist and risk blocks appended
    Polished,
    /// Speaker notes attached; terminal
    Noted,
}

/// Stages produced by stage operations, in execution order
pub const PIPELINE: [Stage; 4] = [Stage::Briefed, Stage::Debated, Stage::Polished, Stage::Noted];

/// Speaker notes attached by the final stage
pub const SPEAKER_NOTES: [&str; 2] = [
    "Pause for emphasis after the core policy statement.",
    "Cite the specific policy document when mentioning achievements.",
];

impl Stage {
    /// Stage that must be committed before this one can run
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Stage::Initial => None,
            Stage::Briefed => Some(Stage::Initial),
            Stage::Debated => Some(Stage::Briefed),
            Stage::Polished => Some(Stage::Debated),
            Stage::Noted => Some(Stage::Polished),
        }
    }

    /// Stage that follows this one
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Initial => Some(Stage::Briefed),
            Stage::Briefed => Some(Stage::Debated),
            Stage::Debated => Some(Stage::Polished),
            Stage::Polished => Some(Stage::Noted),
            Stage::Noted => None,
        }
    }

    /// Roles invoked to produce this stage, in merge order
    pub fn roles(self) -> &'static [Role] {
        match self {
            Stage::Initial | Stage::Noted => &[],
            Stage::Briefed => &[Role::PolicyExpert, Role::DataAdvisor, Role::LogicArchitect],
            Stage::Debated => &crate::role::ROLE_ORDER,
            Stage::Polished => &[Role::Stylist, Role::RiskReviewer],
        }
    }

    /// Identifiers of [`Stage::roles`]
    pub fn role_ids(self) -> Vec<&'static str> {
        self.roles().iter().map(|role| role.id()).collect()
    }

    /// Reason shown at the checkpoint that ends this stage
    ///
    /// `None` for stages that do not pause.
    pub fn checkpoint_reason(self) -> Option<&'static str> {
        match self {
            Stage::Briefed => Some("Review and approve the initial outline."),
            Stage::Debated => Some("Resolve disagreements and select direction."),
            Stage::Polished => Some("Finalize wording and risk findings."),
            Stage::Initial | Stage::Noted => None,
        }
    }

    /// Whether the stage ends the session
    pub fn is_terminal(self) -> bool {
        self == Stage::Noted
    }

    /// Name of the operation that produces this stage
    pub fn operation(self) -> &'static str {
        match self {
            Stage::Initial => "start",
            Stage::Briefed => "initial_briefing",
            Stage::Debated => "debate_round",
            Stage::Polished => "polish_and_risk_check",
            Stage::Noted => "generate_speaker_notes",
        }
    }

    /// Short description for listings
    pub fn description(self) -> &'static str {
        match self {
            Stage::Initial => "Empty draft before any role has contributed",
            Stage::Briefed => "Outline from policy, data and logic roles",
            Stage::Debated => "Critiques and revisions from every role",
            Stage::Polished => "Stylistic polish and risk review",
            Stage::Noted => "Speaker notes for delivery",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Briefed => "briefed",
            Stage::Debated => "debated",
            Stage::Polished => "polished",
            Stage::Noted => "noted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How strictly stage operations are ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencingMode {
    /// Each stage only runs right after its predecessor
    #[default]
    Strict,
    /// Any stage may run at any time against the current draft
    Permissive,
}

/// Fixed speaker notes as owned strings
pub fn speaker_notes() -> Vec<String> {
    SPEAKER_NOTES.iter().map(|note| note.to_string()).collect()
}
