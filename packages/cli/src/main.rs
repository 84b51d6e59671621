#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the crime dashboard.
//!
//! ```text
//! crime_dashboard serve [--interactive]
//! crime_dashboard user add --name <NAME> --email <EMAIL> --role <ROLE> [--password <PW>]
//! crime_dashboard user list
//! crime_dashboard fir list [--q <TERM>] [--page <N>]
//! crime_dashboard fir show <ID>
//! crime_dashboard fir status <ID> <STATUS>
//! crime_dashboard patrol score <FILE>
//! ```
//!
//! Running with no subcommand prompts for what to do. Every command reads
//! the same environment variables as the server (`DATABASE_PATH`,
//! `UPLOAD_DIR`, ...).

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crime_dashboard_crime_models::{FirStatus, UserRole};
use crime_dashboard_database::accounts::NewUser;
use crime_dashboard_fir_models::{FirRecord, is_valid_email};
use crime_dashboard_patrol::score_inputs;
use crime_dashboard_patrol_models::HotspotInput;
use crime_dashboard_server::{AppState, ServerConfig};
use dialoguer::{Input, Password, Select};

#[derive(Parser)]
#[command(name = "crime_dashboard", about = "Crime dashboard server and tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Prompt for bind address and port first
        #[arg(long)]
        interactive: bool,
    },
    /// Manage dashboard accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Browse and update FIRs
    Fir {
        #[command(subcommand)]
        command: FirCommands,
    },
    /// Patrol allocation
    Patrol {
        #[command(subcommand)]
        command: PatrolCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create an account
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// admin, investigator, or user
        #[arg(long, default_value = "user")]
        role: UserRole,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// List accounts
    List,
}

#[derive(Subcommand)]
enum FirCommands {
    /// List FIRs, newest first
    List {
        /// Search term (ID, complainant, incident type, or location)
        #[arg(long)]
        q: Option<String>,
        /// Page number (six per page)
        #[arg(long)]
        page: Option<usize>,
    },
    /// Show one FIR with its attachments
    Show { id: i64 },
    /// Move a FIR to the next status
    Status {
        id: i64,
        /// pending, "under investigation", or resolved
        status: FirStatus,
    },
}

#[derive(Subcommand)]
enum PatrolCommands {
    /// Score a JSON array of hotspots and print the plan
    Score { file: PathBuf },
}

/// Top-level choices offered when no subcommand is given.
enum Tool {
    Serve,
    AddUser,
    ListFirs,
    ScorePatrol,
}

impl Tool {
    const ALL: &[Self] = &[Self::Serve, Self::AddUser, Self::ListFirs, Self::ScorePatrol];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Serve => "Start server",
            Self::AddUser => "Add an account",
            Self::ListFirs => "List FIRs",
            Self::ScorePatrol => "Score a hotspot file",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = ServerConfig::from_env();

    let command = match cli.command {
        Some(command) => command,
        None => prompt_command()?,
    };

    match command {
        Commands::Serve { interactive } => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(async move {
                    if interactive {
                        crime_dashboard_server::interactive::run(config).await
                    } else {
                        crime_dashboard_server::run_server(config).await
                    }
                })
            })
            .await??;
        }
        Commands::User { command } => run_user(command, &config).await?,
        Commands::Fir { command } => run_fir(command, &config).await?,
        Commands::Patrol {
            command: PatrolCommands::Score { file },
        } => score_file(&file)?,
    }

    Ok(())
}

fn prompt_command() -> Result<Commands, Box<dyn std::error::Error>> {
    println!("Crime Dashboard");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match Tool::ALL[idx] {
        Tool::Serve => Commands::Serve { interactive: true },
        Tool::AddUser => {
            let name: String = Input::new().with_prompt("Name").interact_text()?;
            let email: String = Input::new().with_prompt("E-mail").interact_text()?;
            let roles = [UserRole::Admin, UserRole::Investigator, UserRole::User];
            let role_labels: Vec<String> = roles.iter().map(ToString::to_string).collect();
            let role = Select::new()
                .with_prompt("Role")
                .items(&role_labels)
                .default(2)
                .interact()?;
            Commands::User {
                command: UserCommands::Add {
                    name,
                    email,
                    role: roles[role],
                    password: None,
                },
            }
        }
        Tool::ListFirs => Commands::Fir {
            command: FirCommands::List { q: None, page: None },
        },
        Tool::ScorePatrol => {
            let file: String = Input::new()
                .with_prompt("Hotspot JSON file")
                .interact_text()?;
            Commands::Patrol {
                command: PatrolCommands::Score { file: file.into() },
            }
        }
    })
}

async fn run_user(
    command: UserCommands,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::open(config).await?;

    match command {
        UserCommands::Add {
            name,
            email,
            role,
            password,
        } => {
            let email = email.trim().to_string();
            if !is_valid_email(&email) {
                return Err(format!("\"{email}\" is not an e-mail address").into());
            }

            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Repeat password", "Passwords do not match")
                    .interact()?,
            };
            if password.is_empty() {
                return Err("Password must not be empty".into());
            }

            let user = state
                .accounts
                .create_user(NewUser {
                    name,
                    email,
                    role,
                    password,
                })
                .await?;
            println!("Created {} account {} ({})", user.role, user.id, user.email);
        }
        UserCommands::List => {
            let users = state.accounts.list_users().await?;
            if users.is_empty() {
                println!("No accounts found.");
                return Ok(());
            }

            println!("{:<6} {:<14} {:<32} NAME", "ID", "ROLE", "E-MAIL");
            for user in users {
                println!(
                    "{:<6} {:<14} {:<32} {}",
                    user.id,
                    user.role.to_string(),
                    user.email,
                    user.name
                );
            }
        }
    }

    Ok(())
}

async fn run_fir(
    command: FirCommands,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::open(config).await?;

    match command {
        FirCommands::List { q, page } => {
            let firs = if let Some(page) = page {
                let page = state.firs.page(q.as_deref(), page).await?;
                println!(
                    "Page {} of {} ({} FIRs)",
                    page.page, page.total_pages, page.total_count
                );
                page.items
            } else {
                state.firs.list(q.as_deref()).await?
            };

            if firs.is_empty() {
                println!("No FIRs found.");
            }
            for fir in &firs {
                println!("{}", summary_line(fir));
            }
        }
        FirCommands::Show { id } => {
            let fir = state.firs.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&fir)?);
        }
        FirCommands::Status { id, status } => {
            let fir = state.firs.transition(id, status).await?;
            println!("{}", summary_line(&fir));
        }
    }

    Ok(())
}

fn score_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let hotspots: Vec<HotspotInput> = serde_json::from_str(&raw)?;
    let plan = score_inputs(hotspots)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn summary_line(fir: &FirRecord) -> String {
    format!(
        "#{:<5} {} {:<20} {:<6} {} at {} ({}, {} attachment(s))",
        fir.id,
        fir.incident_date,
        fir.status.to_string(),
        fir.priority.to_string(),
        fir.incident_type,
        fir.location,
        fir.complainant_name,
        fir.attachments.len()
    )
}
