//! System prompts for the drafting roles
//!
//! Each role has a prompt that fixes its remit and output format.
//! Prompts are only used by model-backed contributors.

mod data_advisor;
mod logic_architect;
mod policy_expert;
mod risk_reviewer;
mod stylist;

pub use data_advisor::DATA_ADVISOR_PROMPT;
pub use logic_architect::LOGIC_ARCHITECT_PROMPT;
pub use policy_expert::POLICY_EXPERT_PROMPT;
pub use risk_reviewer::RISK_REVIEWER_PROMPT;
pub use stylist::STYLIST_PROMPT;

use crate::role::Role;

/// Default system prompt for a role
pub fn for_role(role: Role) -> &'static str {
    match role {
        Role::PolicyExpert => POLICY_EXPERT_PROMPT,
        Role::DataAdvisor => DATA_ADVISOR_PROMPT,
        Role::LogicArchitect => LOGIC_ARCHITECT_PROMPT,
        Role::Stylist => STYLIST_PROMPT,
        Role::RiskReviewer => RISK_REVIEWER_PROMPT,
    }
}
