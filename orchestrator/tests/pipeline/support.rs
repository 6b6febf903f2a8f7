//! Shared fakes for pipeline tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use speech_orchestrator::{
    Contributor, Draft, DraftingSession, FnContributor, Role, RoleConfig, RoleRegistry,
    SequencingMode, SpeechRequest, ROLE_ORDER,
};

/// Contributor that sleeps before answering, to vary completion order
pub struct Delayed {
    pub text: String,
    pub delay: Duration,
}

impl Delayed {
    pub fn new(text: &str, millis: u64) -> Self {
        Self {
            text: text.to_string(),
            delay: Duration::from_millis(millis),
        }
    }
}

#[async_trait]
impl Contributor for Delayed {
    async fn generate(&self, _request: &SpeechRequest, _draft: &Draft) -> anyhow::Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.clone())
    }
}

/// Short fixed output per role
pub fn short_text(role: Role) -> &'static str {
    match role {
        Role::PolicyExpert => "p",
        Role::DataAdvisor => "d",
        Role::LogicArchitect => "l",
        Role::Stylist => "s",
        Role::RiskReviewer => "r",
    }
}

/// Registry where every role returns its short fixed text
pub fn fixed_registry() -> RoleRegistry {
    let mut registry = RoleRegistry::new();
    for role in ROLE_ORDER {
        registry.register(RoleConfig::new(role), FnContributor::fixed(short_text(role)));
    }
    registry
}

/// Registry where earlier roles answer later than later roles
pub fn reversed_latency_registry() -> RoleRegistry {
    let mut registry = RoleRegistry::new();
    for role in ROLE_ORDER {
        let delay = (ROLE_ORDER.len() - role.position()) as u64 * 15;
        registry.register(RoleConfig::new(role), Delayed::new(short_text(role), delay));
    }
    registry
}

pub fn request() -> SpeechRequest {
    SpeechRequest::new("X", "Y", "formal", 10).with_keywords(["growth", "jobs", "climate"])
}

pub fn session(registry: RoleRegistry) -> DraftingSession {
    DraftingSession::new(request(), Arc::new(registry)).unwrap()
}

pub fn permissive_session(registry: RoleRegistry) -> DraftingSession {
    session(registry).with_sequencing(SequencingMode::Permissive)
}

/// Position of each needle in `haystack`, each searched after the previous match
pub fn positions(haystack: &str, needles: &[&str]) -> Vec<usize> {
    let mut from = 0;
    needles
        .iter()
        .map(|needle| {
            let at = haystack[from..]
                .find(needle)
                .map(|i| i + from)
                .unwrap_or_else(|| panic!("{:?} not found after {} in {:?}", needle, from, haystack));
            from = at + needle.len();
            at
        })
        .collect()
}
