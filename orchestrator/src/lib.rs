//! Checkpointed multi-role speech drafting
//!
//! This crate provides:
//! - A fixed set of drafting roles and a registry of their contributors
//! - The evolving draft with ordered, append-only merging
//! - Checkpoint signals that suspend the workflow for human review
//! - A session state machine (briefing, debate, polish, notes) and an
//!   engine that drives it through checkpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use speech_orchestrator::{EngineConfig, RoleRegistry, SpeechRequest, WorkflowEngine};
//!
//! let registry = Arc::new(RoleRegistry::with_templates());
//! let engine = WorkflowEngine::new(registry, EngineConfig::default());
//!
//! let report = engine
//!     .run(SpeechRequest::new("Harbour reopening", "Residents", "warm", 7))
//!     .await?;
//! ```

pub mod agent_config;
pub mod checkpoint;
pub mod config;
pub mod contributor;
pub mod draft;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod request;
pub mod role;
pub mod session;
pub mod workflow;

pub use agent_config::{RoleConfig, RoleRegistry};
pub use checkpoint::{Checkpoint, CheckpointHandler, Decision, StageOutcome};
pub use config::{EngineConfig, FileConfig, LlmConfig};
pub use contributor::{ChatContributor, Contributor, FnContributor, TemplateContributor};
pub use draft::{Contributions, Draft, DraftSnapshot};
pub use engine::{SessionFailure, WorkflowEngine};
pub use error::{DraftError, DraftResult};
pub use request::{SpeechRequest, UploadedSource};
pub use role::{Role, ROLE_ORDER};
pub use session::{DraftingSession, SessionReport, SessionState, SessionStatus};
pub use workflow::{SequencingMode, Stage};
