//! `adapt` CLI: seed the demo catalog, onboard learners, show dashboards and
//! run timed quizzes in the terminal.

use std::path::PathBuf;
use std::process;

use adapt_core::model::{QuizId, SkillId, UserId};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use services::{AppServices, Clock, EngineConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod commands;
mod db;

#[derive(Parser)]
#[command(name = "adapt", version, about = "Adaptive skill progression and quizzes")]
struct Cli {
    /// SQLite database (path or URL); overrides config and ADAPT_DB_URL
    #[arg(long, global = true)]
    db: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the demo skill track and quizzes
    Seed,

    /// List the skill catalog
    Skills,

    /// List available quizzes
    Quizzes,

    /// Create a learner's progress records
    Onboard {
        #[arg(long)]
        user: UserId,
    },

    /// Show progress, next skill, weak spot and forecast
    Dashboard {
        #[arg(long)]
        user: UserId,
    },

    /// Begin a skill whose prerequisites are done
    StartSkill {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        skill: SkillId,
    },

    /// Mark a skill completed
    CompleteSkill {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        skill: SkillId,
    },

    /// Take a timed quiz interactively
    Quiz {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        quiz: QuizId,
        /// Time budget in seconds; overrides config
        #[arg(long)]
        time_budget: Option<u32>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = &cli.db {
        config.database_url.clone_from(db);
    }
    config.database_url = db::normalize_sqlite_url(&config.database_url);
    if let Commands::Quiz {
        time_budget: Some(budget),
        ..
    } = cli.command
    {
        config.quiz_time_budget_secs = budget;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    db::prepare_sqlite_file(&config.database_url)?;
    let services = AppServices::new_sqlite(&config, Clock::system())
        .await
        .with_context(|| format!("opening {}", config.database_url))?;

    match cli.command {
        Commands::Seed => commands::catalog::seed(&services).await,
        Commands::Skills => commands::catalog::skills(&services).await,
        Commands::Quizzes => commands::catalog::quizzes(&services).await,
        Commands::Onboard { user } => commands::progress::onboard(&services, user).await,
        Commands::Dashboard { user } => commands::progress::dashboard(&services, user).await,
        Commands::StartSkill { user, skill } => {
            commands::progress::start_skill(&services, user, skill).await
        }
        Commands::CompleteSkill { user, skill } => {
            commands::progress::complete_skill(&services, user, skill).await
        }
        Commands::Quiz { user, quiz, .. } => commands::quiz::execute(&services, user, quiz).await,
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: starting runtime: {e}");
            process::exit(1);
        }
    };
    let result = runtime.block_on(run(cli));
    // An unanswered quiz prompt leaves a blocking stdin read behind.
    runtime.shutdown_background();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
