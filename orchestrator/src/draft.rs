//! The evolving speech draft
//!
//! Every operation returns a new [`Draft`]; previously committed text is
//! never removed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::{Role, ROLE_ORDER};
use crate::workflow::Stage;

/// Per-role output of one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contributions {
    entries: BTreeMap<Role, String>,
}

impl Contributions {
    /// Create an empty set of contributions
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a role's text, replacing any earlier entry for that role
    pub fn insert(&mut self, role: Role, text: impl Into<String>) {
        self.entries.insert(role, text.into());
    }

    /// Text contributed by `role`
    pub fn get(&self, role: Role) -> Option<&str> {
        self.entries.get(&role).map(String::as_str)
    }

    /// Roles that contributed, in [`ROLE_ORDER`]
    pub fn roles(&self) -> Vec<Role> {
        self.ordered().map(|(role, _)| role).collect()
    }

    /// Entries in [`ROLE_ORDER`], independent of insertion order
    pub fn ordered(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        ROLE_ORDER
            .iter()
            .filter_map(|role| self.entries.get(role).map(|text| (*role, text.as_str())))
    }

    /// Contributions joined by newlines in [`ROLE_ORDER`]
    pub fn joined(&self) -> String {
        self.ordered()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Role, String)> for Contributions {
    fn from_iter<I: IntoIterator<Item = (Role, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The workflow artifact: text, current-stage rationale and speaker notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Full speech text accumulated so far
    pub text: String,

    /// Rationale of the roles that shaped the current stage
    #[serde(default)]
    pub rationale: Contributions,

    /// Speaker notes, filled in by the final stage
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Draft {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `contributions` to the text and make them the new rationale
    pub fn merge(&self, contributions: &Contributions) -> Draft {
        let joined = contributions.joined();
        let text = if self.text.is_empty() {
            joined
        } else {
            format!("{}\n{}", self.text, joined)
        };

        Draft {
            text,
            rationale: contributions.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Append labeled blocks (`"\n\n[label]\n<text>"`), keeping the rationale
    pub fn append_blocks(&self, blocks: &[(&str, &str)]) -> Draft {
        let mut text = self.text.clone();
        for (label, body) in blocks {
            text.push_str(&format!("\n\n[{}]\n{}", label, body));
        }

        Draft {
            text,
            rationale: self.rationale.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Replace the speaker notes only
    pub fn with_notes(&self, notes: Vec<String>) -> Draft {
        Draft {
            text: self.text.clone(),
            rationale: self.rationale.clone(),
            notes,
        }
    }

    /// Whether this draft keeps all of `earlier`'s text as a prefix
    pub fn extends(&self, earlier: &Draft) -> bool {
        self.text.starts_with(&earlier.text)
    }
}

/// A draft recorded in session history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    /// Stage that produced the draft
    pub stage: Stage,

    /// Attempt number for the stage (1 for the first run)
    pub attempt: u32,

    /// The draft as committed
    pub draft: Draft,

    /// When the snapshot was taken
    pub recorded_at: DateTime<Utc>,
}

impl DraftSnapshot {
    pub fn new(stage: Stage, attempt: u32, draft: Draft) -> Self {
        Self {
            stage,
            attempt,
            draft,
            recorded_at: Utc::now(),
        }
    }
}
