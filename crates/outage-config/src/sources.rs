// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ReporterConfigLayer;
use crate::sections::{CheckConfigLayer, DatabaseConfigLayer, LogFormat, LoggingConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ReporterConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ReporterConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/outage-reporter/config.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ReporterConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ReporterConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: OUTAGE_REPORTER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ReporterConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from(&|name| std::env::var(name).ok())
	}
}

type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

fn load_from(lookup: &Lookup<'_>) -> Result<ReporterConfigLayer, ConfigError> {
	Ok(ReporterConfigLayer {
		database: Some(DatabaseConfigLayer {
			url: env_var(lookup, "OUTAGE_REPORTER_DATABASE_URL"),
		}),
		check: Some(load_check_from_env(lookup)?),
		logging: Some(load_logging_from_env(lookup)?),
	})
}

fn env_var(lookup: &Lookup<'_>, name: &str) -> Option<String> {
	lookup(name).filter(|s| !s.is_empty())
}

fn env_u64(lookup: &Lookup<'_>, name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(lookup, name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_check_from_env(lookup: &Lookup<'_>) -> Result<CheckConfigLayer, ConfigError> {
	let headers = match env_var(lookup, "OUTAGE_REPORTER_CHECK_HEADERS") {
		Some(json) => Some(
			serde_json::from_str::<BTreeMap<String, String>>(&json).map_err(|e| {
				ConfigError::invalid_value(
					"OUTAGE_REPORTER_CHECK_HEADERS",
					format!("expected a JSON object of string values: {e}"),
				)
			})?,
		),
		None => None,
	};

	Ok(CheckConfigLayer {
		schedule: env_var(lookup, "OUTAGE_REPORTER_CHECK_SCHEDULE"),
		endpoint: env_var(lookup, "OUTAGE_REPORTER_CHECK_ENDPOINT"),
		webhook_rss_endpoint: env_var(lookup, "OUTAGE_REPORTER_CHECK_WEBHOOK_RSS_ENDPOINT"),
		headers,
		timeout_secs: env_u64(lookup, "OUTAGE_REPORTER_CHECK_TIMEOUT_SECS")?,
	})
}

fn load_logging_from_env(lookup: &Lookup<'_>) -> Result<LoggingConfigLayer, ConfigError> {
	let format = env_var(lookup, "OUTAGE_REPORTER_LOG_FORMAT")
		.map(|v| v.parse::<LogFormat>())
		.transpose()?;

	Ok(LoggingConfigLayer {
		level: env_var(lookup, "OUTAGE_REPORTER_LOG_LEVEL"),
		format,
	})
}
