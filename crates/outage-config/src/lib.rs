// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the outage reporter.
//!
//! This crate provides:
//! - Layered configuration from defaults, a TOML file and the environment
//! - Validation of the check job's endpoints before anything runs
//! - Consistent environment variable naming (`OUTAGE_REPORTER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use outage_config::load_config_with_file;
//!
//! let config = load_config_with_file("config.toml")?;
//! println!("Polling {} on {}", config.check.endpoint, config.check.schedule);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ReporterConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved reporter configuration.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
	pub database: DatabaseConfig,
	pub check: CheckConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`OUTAGE_REPORTER_*`)
/// 2. Config file (`/etc/outage-reporter/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ReporterConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ReporterConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ReporterConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ReporterConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ReporterConfigLayer) -> Result<ReporterConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let check = layer.check.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		database = %database.url,
		schedule = %check.schedule,
		endpoint = %check.endpoint,
		header_count = check.headers.len(),
		timeout_secs = check.timeout_secs,
		log_format = %logging.format,
		"Reporter configuration loaded"
	);

	Ok(ReporterConfig {
		database,
		check,
		logging,
	})
}
