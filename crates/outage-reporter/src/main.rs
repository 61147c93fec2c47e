// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outage reporter binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use outage_config::{LogFormat, LoggingConfig, ReporterConfig};
use outage_db::{OutageRepository, SqliteOutageRepository};
use outage_jobs::{execute, CancellationToken, JobScheduler, TriggerSource};
use outage_reporter::build_check_job;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Posts new Virgin Media broadband outages to an RSS webhook.
#[derive(Parser, Debug)]
#[command(name = "outage-reporter", about = "Virgin Media outage reporter", version)]
struct Args {
	/// Path to the TOML config file
	#[arg(long, short, env = "OUTAGE_REPORTER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the check on its schedule until interrupted (default)
	Run,
	/// Run the check once and exit
	Check,
	/// Show recorded outages
	Status {
		/// Number of recent outages to list
		#[arg(long, default_value_t = 10)]
		limit: u32,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => outage_config::load_config_with_file(path)?,
		None => outage_config::load_config()?,
	};

	init_tracing(&config.logging);

	tracing::info!(
		database = %config.database.url,
		schedule = %config.check.schedule,
		"starting outage-reporter"
	);

	let pool = outage_db::create_pool(&config.database.url).await?;
	outage_db::run_migrations(&pool).await?;

	match args.command.unwrap_or(Command::Run) {
		Command::Run => run_scheduled(&config, pool).await,
		Command::Check => run_once(&config, pool).await,
		Command::Status { limit } => show_status(pool, limit).await,
	}
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| logging.level.clone().into());

	match logging.format {
		LogFormat::Pretty => tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.init(),
		LogFormat::Json => tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
	}
}

async fn run_scheduled(
	config: &ReporterConfig,
	pool: sqlx::SqlitePool,
) -> Result<(), Box<dyn std::error::Error>> {
	let job = build_check_job(&config.check, pool)?;

	let mut scheduler = JobScheduler::new();
	scheduler.register(Arc::new(job))?;
	scheduler.start().await?;

	shutdown_signal().await;
	tracing::info!("Received shutdown signal");
	scheduler.shutdown().await;

	tracing::info!("outage-reporter shutdown complete");
	Ok(())
}

async fn run_once(
	config: &ReporterConfig,
	pool: sqlx::SqlitePool,
) -> Result<(), Box<dyn std::error::Error>> {
	let job = build_check_job(&config.check, pool)?;

	let token = CancellationToken::new();
	let signal_token = token.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		signal_token.cancel();
	});

	let (run, result) = execute(&job, TriggerSource::Manual, token).await;
	let output = result?;

	println!("{}", output.message);
	if let Some(metadata) = output.metadata {
		println!("{}", serde_json::to_string_pretty(&metadata)?);
	}
	tracing::debug!(run_id = %run.id, duration_ms = ?run.duration_ms, "check finished");
	Ok(())
}

async fn show_status(pool: sqlx::SqlitePool, limit: u32) -> Result<(), Box<dyn std::error::Error>> {
	let repo = SqliteOutageRepository::new(pool);

	println!("Recorded outages: {}", repo.count().await?);
	for outage in repo.list_recent(limit).await? {
		println!("  {}  {}", outage.created_at, outage.outage_id);
	}
	Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "Failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {}
		_ = terminate => {}
	}
}
