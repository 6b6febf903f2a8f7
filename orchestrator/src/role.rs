//! Role identifiers
//!
//! The set of roles is closed. Text assembly always walks [`ROLE_ORDER`],
//! never map iteration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DraftError;

/// One of the five fixed contributor categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    PolicyExpert,
    DataAdvisor,
    LogicArchitect,
    Stylist,
    RiskReviewer,
}

/// Declaration order of the roles, used for every merge
pub const ROLE_ORDER: [Role; 5] = [
    Role::PolicyExpert,
    Role::DataAdvisor,
    Role::LogicArchitect,
    Role::Stylist,
    Role::RiskReviewer,
];

impl Role {
    /// Stable identifier (e.g. "policy-expert")
    pub fn id(self) -> &'static str {
        match self {
            Role::PolicyExpert => "policy-expert",
            Role::DataAdvisor => "data-advisor",
            Role::LogicArchitect => "logic-architect",
            Role::Stylist => "stylist",
            Role::RiskReviewer => "risk-reviewer",
        }
    }

    /// Human-readable name for logs and prompts
    pub fn display_name(self) -> &'static str {
        match self {
            Role::PolicyExpert => "Policy Expert",
            Role::DataAdvisor => "Data Advisor",
            Role::LogicArchitect => "Logic Architect",
            Role::Stylist => "Stylist",
            Role::RiskReviewer => "Risk Reviewer",
        }
    }

    /// Position in [`ROLE_ORDER`]
    pub fn position(self) -> usize {
        ROLE_ORDER
            .iter()
            .position(|r| *r == self)
            .unwrap_or(ROLE_ORDER.len())
    }

    /// Iterate all roles in declaration order
    pub fn all() -> impl Iterator<Item = Role> {
        ROLE_ORDER.into_iter()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Role {
    type Err = DraftError;

    /// Accepts kebab-case ids and their snake_case spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ROLE_ORDER
            .into_iter()
            .find(|role| role.id() == normalized)
            .ok_or_else(|| DraftError::UnknownRole(s.to_string()))
    }
}
