//! Speech orchestrator CLI
//!
//! Demo driver for the drafting workflow.
//!
//! Usage:
//!   speech-orchestrator run --request speech.toml
//!   speech-orchestrator run --non-interactive --llm
//!   speech-orchestrator roles list
//!   speech-orchestrator roles show stylist
//!   speech-orchestrator stages

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use speech_orchestrator::config::FileConfig;
use speech_orchestrator::workflow::PIPELINE;
use speech_orchestrator::{
    Role, RoleRegistry, SequencingMode, SessionStatus, SpeechRequest, WorkflowEngine,
};

#[derive(Parser)]
#[command(name = "speech-orchestrator")]
#[command(about = "Checkpointed multi-role speech drafting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to discovering .speech-orchestrator.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft a speech
    Run {
        /// Request file (TOML or JSON); the demo request is used if omitted
        #[arg(long, short)]
        request: Option<PathBuf>,

        /// Auto-approve every checkpoint
        #[arg(long)]
        non_interactive: bool,

        /// Allow stage operations in any order
        #[arg(long)]
        permissive: bool,

        /// Use chat-completion contributors instead of templates
        #[arg(long)]
        llm: bool,

        /// Chat-completion base URL
        #[arg(long, env = "SPEECH_LLM_BASE_URL")]
        base_url: Option<String>,

        /// Default model for every role
        #[arg(short = 'm', long, env = "SPEECH_LLM_MODEL")]
        model: Option<String>,

        /// Seconds to wait for each checkpoint decision
        #[arg(long)]
        checkpoint_timeout: Option<u64>,

        /// Print the session state as JSON when done
        #[arg(long)]
        json: bool,
    },
    /// Role configuration
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },
    /// Show the stage pipeline
    Stages,
}

#[derive(Subcommand)]
enum RoleCommands {
    /// List roles
    List,
    /// Show a role's configuration
    Show {
        /// Role identifier (e.g. "policy-expert")
        role: String,
    },
}

/// Initialize tracing with the given verbosity level
///
/// - 0: warn (default)
/// - 1: info (-v)
/// - 2: debug (-vv)
/// - 3+: trace (-vvv)
///
/// Set `LOG_FORMAT=json` for JSON output. Logs go to stderr.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // Allow RUST_LOG to override if set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => FileConfig::load_from_path(path)?,
        None => FileConfig::load()?,
    };

    match cli.command {
        Commands::Run {
            request,
            non_interactive,
            permissive,
            llm,
            base_url,
            model,
            checkpoint_timeout,
            json,
        } => {
            let mut config = file_config;
            if let Some(url) = base_url {
                config.llm.base_url = url;
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            if non_interactive {
                config.engine.non_interactive = true;
            }
            if permissive {
                config.engine.sequencing = SequencingMode::Permissive;
            }
            if checkpoint_timeout.is_some() {
                config.engine.checkpoint_timeout_secs = checkpoint_timeout;
            }

            let request = match request {
                Some(path) => SpeechRequest::from_file(&path)?,
                None => SpeechRequest::demo(),
            };

            run_draft(config, request, llm, json).await
        }
        Commands::Roles { command } => run_roles_command(command, &file_config),
        Commands::Stages => {
            println!("Stages:\n");
            for (i, stage) in PIPELINE.iter().enumerate() {
                let roles = stage.role_ids();
                println!("  {}. {} - {}", i + 1, stage.operation(), stage.description());
                if !roles.is_empty() {
                    println!("     Roles: {}", roles.join(", "));
                }
                if let Some(reason) = stage.checkpoint_reason() {
                    println!("     Checkpoint: {}", reason);
                }
            }
            Ok(())
        }
    }
}

async fn run_draft(config: FileConfig, request: SpeechRequest, llm: bool, json: bool) -> Result<()> {
    let registry = if llm {
        RoleRegistry::with_chat(&config.llm, &config.roles)?
    } else {
        RoleRegistry::with_templates_and_overrides(&config.roles)
    };

    let engine = WorkflowEngine::new(Arc::new(registry), config.engine);
    let mut session = engine.start(request)?;
    let report = match engine.drive(&mut session).await {
        Ok(report) => report,
        Err(failure) => {
            eprintln!(
                "Stopped after stage {} ({} snapshots kept)",
                session.stage(),
                failure.report.history.len()
            );
            if json {
                println!("{}", session.state().to_json()?);
            }
            return Err(failure.into());
        }
    };

    match &report.status {
        SessionStatus::Completed => {
            println!("--- Latest draft ---");
            println!("{}", report.final_draft.text);
            println!("--- Speaker notes ---");
            for note in &report.final_draft.notes {
                println!("- {}", note);
            }
        }
        SessionStatus::Aborted(reason) => {
            println!("Session aborted: {}", reason);
            println!("Stages recorded: {}", report.history.len());
        }
        SessionStatus::Active => {
            println!("Session stopped at stage {}", session.stage());
        }
    }

    if json {
        println!("{}", session.state().to_json()?);
    }

    Ok(())
}

fn run_roles_command(command: RoleCommands, config: &FileConfig) -> Result<()> {
    let registry = RoleRegistry::with_templates_and_overrides(&config.roles);

    match command {
        RoleCommands::List => {
            println!("Roles:\n");
            for role_config in registry.iter() {
                println!(
                    "  {} ({}) - {}",
                    role_config.role,
                    role_config.model(&config.llm),
                    role_config.display_name()
                );
            }
        }
        RoleCommands::Show { role } => {
            let role: Role = role.parse()?;
            match registry.config(role) {
                Some(role_config) => {
                    println!("Role: {}\n", role_config.role);
                    println!("Display Name: {}", role_config.display_name());
                    println!("Model: {}", role_config.model(&config.llm));
                    println!("Temperature: {}", role_config.temperature(&config.llm));
                    println!("\nSystem Prompt:\n{}", role_config.system_prompt());
                }
                None => {
                    eprintln!("Role '{}' is not registered.", role);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
