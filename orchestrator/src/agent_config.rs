//! Role configuration and registry
//!
//! The registry maps each role to its configuration and contributor. It is
//! built once by the session owner and only read afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::contributor::{ChatContributor, Contributor, TemplateContributor};
use crate::error::{DraftError, DraftResult};
use crate::prompts;
use crate::role::{Role, ROLE_ORDER};

/// Configuration for a drafting role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Role this configuration applies to
    pub role: Role,

    /// Display name for UI/logging
    #[serde(default)]
    pub display_name: Option<String>,

    /// Model override (falls back to `[llm].model`)
    #[serde(default)]
    pub model: Option<String>,

    /// System prompt override (falls back to the built-in prompt)
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Temperature override (falls back to `[llm].temperature`)
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl RoleConfig {
    /// Create a configuration with every setting at its default
    pub fn new(role: Role) -> Self {
        Self {
            role,
            display_name: None,
            model: None,
            system_prompt: None,
            temperature: None,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.role.display_name())
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or_else(|| prompts::for_role(self.role))
    }

    pub fn model<'a>(&'a self, llm: &'a LlmConfig) -> &'a str {
        self.model.as_deref().unwrap_or(&llm.model)
    }

    pub fn temperature(&self, llm: &LlmConfig) -> f32 {
        self.temperature.unwrap_or(llm.temperature)
    }

    /// Fill unset fields from `other` (which takes precedence where set)
    fn overlay(mut self, other: &RoleConfig) -> Self {
        if other.display_name.is_some() {
            self.display_name = other.display_name.clone();
        }
        if other.model.is_some() {
            self.model = other.model.clone();
        }
        if other.system_prompt.is_some() {
            self.system_prompt = other.system_prompt.clone();
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        self
    }
}

/// A registered role
#[derive(Clone)]
pub struct RoleEntry {
    pub config: RoleConfig,
    pub contributor: Arc<dyn Contributor>,
}

/// Registry of role contributors
#[derive(Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<Role, RoleEntry>,
}

impl RoleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    /// Registry with deterministic template contributors for every role
    pub fn with_templates() -> Self {
        Self::with_templates_and_overrides(&[])
    }

    /// Template registry whose display names honour `overrides`
    pub fn with_templates_and_overrides(overrides: &[RoleConfig]) -> Self {
        let mut registry = Self::new();
        for role in ROLE_ORDER {
            let config = resolve_config(role, overrides);
            let contributor = TemplateContributor::new(role).with_label(config.display_name());
            registry.register(config, contributor);
        }
        registry
    }

    /// Registry with chat-completion contributors for every role
    ///
    /// Fails if the API key variable named in `llm` is unset.
    pub fn with_chat(llm: &LlmConfig, overrides: &[RoleConfig]) -> DraftResult<Self> {
        let api_key = llm.api_key().ok_or_else(|| {
            DraftError::Config(format!("{} is not set", llm.api_key_env))
        })?;

        let mut registry = Self::new();
        for role in ROLE_ORDER {
            let config = resolve_config(role, overrides);
            let contributor = ChatContributor::new(
                &llm.base_url,
                api_key.clone(),
                config.model(llm),
                config.system_prompt(),
                llm.timeout(),
            )?
            .with_temperature(config.temperature(llm));
            registry.register(config, contributor);
        }
        Ok(registry)
    }

    /// Register (or replace) a role's contributor
    pub fn register(&mut self, config: RoleConfig, contributor: impl Contributor + 'static) {
        self.register_shared(config, Arc::new(contributor));
    }

    /// Register a contributor that is already shared
    pub fn register_shared(&mut self, config: RoleConfig, contributor: Arc<dyn Contributor>) {
        tracing::debug!(role = %config.role, "Registering contributor");
        self.roles.insert(
            config.role,
            RoleEntry {
                config,
                contributor,
            },
        );
    }

    /// Replace one role's contributor and keep its configuration
    pub fn with_contributor(mut self, role: Role, contributor: impl Contributor + 'static) -> Self {
        let config = self
            .roles
            .remove(&role)
            .map(|entry| entry.config)
            .unwrap_or_else(|| RoleConfig::new(role));
        self.register(config, contributor);
        self
    }

    /// Look up the contributor for a role
    pub fn resolve(&self, role: Role) -> DraftResult<Arc<dyn Contributor>> {
        self.roles
            .get(&role)
            .map(|entry| Arc::clone(&entry.contributor))
            .ok_or_else(|| DraftError::UnknownRole(role.to_string()))
    }

    /// Look up a contributor by role identifier
    pub fn resolve_name(&self, name: &str) -> DraftResult<Arc<dyn Contributor>> {
        let role: Role = name.parse()?;
        self.resolve(role)
    }

    /// Get a role's configuration
    pub fn config(&self, role: Role) -> Option<&RoleConfig> {
        self.roles.get(&role).map(|entry| &entry.config)
    }

    /// Check if a role has a contributor
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Registered roles in declaration order
    pub fn roles(&self) -> Vec<Role> {
        ROLE_ORDER
            .into_iter()
            .filter(|role| self.roles.contains_key(role))
            .collect()
    }

    /// Iterate configurations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &RoleConfig> {
        ROLE_ORDER
            .iter()
            .filter_map(|role| self.roles.get(role).map(|entry| &entry.config))
    }
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("roles", &self.roles())
            .finish()
    }
}

fn resolve_config(role: Role, overrides: &[RoleConfig]) -> RoleConfig {
    overrides
        .iter()
        .filter(|o| o.role == role)
        .fold(RoleConfig::new(role), |config, o| config.overlay(o))
}
