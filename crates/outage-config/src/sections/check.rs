// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outage check job configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Daily at 06:00.
pub const DEFAULT_SCHEDULE: &str = "0 0 6 * * *";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Check job configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
	pub schedule: String,
	pub endpoint: String,
	pub webhook_rss_endpoint: String,
	pub headers: BTreeMap<String, String>,
	pub timeout_secs: u64,
}

impl CheckConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

/// Check job configuration layer (partial, for merging).
///
/// `headers` must be a table of strings; any other value type fails to
/// parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckConfigLayer {
	#[serde(default)]
	pub schedule: Option<String>,
	#[serde(default)]
	pub endpoint: Option<String>,
	#[serde(default)]
	pub webhook_rss_endpoint: Option<String>,
	#[serde(default)]
	pub headers: Option<BTreeMap<String, String>>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

impl CheckConfigLayer {
	/// A header map from `other` replaces the whole map, not individual keys.
	pub fn merge(&mut self, other: CheckConfigLayer) {
		if other.schedule.is_some() {
			self.schedule = other.schedule;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.webhook_rss_endpoint.is_some() {
			self.webhook_rss_endpoint = other.webhook_rss_endpoint;
		}
		if other.headers.is_some() {
			self.headers = other.headers;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	pub fn finalize(self) -> Result<CheckConfig, ConfigError> {
		let endpoint = require_http_url("check.endpoint", self.endpoint)?;
		let webhook_rss_endpoint =
			require_http_url("check.webhook_rss_endpoint", self.webhook_rss_endpoint)?;

		let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
		if timeout_secs == 0 {
			return Err(ConfigError::invalid_value(
				"check.timeout_secs",
				"must be greater than zero",
			));
		}

		Ok(CheckConfig {
			schedule: self
				.schedule
				.unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
			endpoint,
			webhook_rss_endpoint,
			headers: self.headers.unwrap_or_default(),
			timeout_secs,
		})
	}
}

fn require_http_url(key: &str, value: Option<String>) -> Result<String, ConfigError> {
	let value = value
		.filter(|v| !v.trim().is_empty())
		.ok_or_else(|| ConfigError::missing_field(key))?;

	let parsed = Url::parse(&value).map_err(|e| ConfigError::invalid_value(key, e.to_string()))?;
	match parsed.scheme() {
		"http" | "https" => Ok(value),
		scheme => Err(ConfigError::invalid_value(
			key,
			format!("unsupported scheme '{scheme}', expected http or https"),
		)),
	}
}
