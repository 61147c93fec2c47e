// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as read from a single source.

use serde::Deserialize;

use crate::sections::{CheckConfigLayer, DatabaseConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration. Absent sections and fields are
/// `None` and leave lower-precedence values untouched when merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReporterConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub check: Option<CheckConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ReporterConfigLayer {
	pub fn merge(&mut self, other: ReporterConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.check, other.check, CheckConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(current: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (current.as_mut(), other) {
		(Some(existing), Some(other)) => merge(existing, other),
		(None, Some(other)) => *current = Some(other),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_keeps_fields_missing_from_later_layer() {
		let mut base = ReporterConfigLayer {
			check: Some(CheckConfigLayer {
				endpoint: Some("https://www.virginmedia.com".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ReporterConfigLayer {
			check: Some(CheckConfigLayer {
				timeout_secs: Some(10),
				..Default::default()
			}),
			..Default::default()
		});

		let check = base.check.unwrap();
		assert_eq!(check.endpoint.as_deref(), Some("https://www.virginmedia.com"));
		assert_eq!(check.timeout_secs, Some(10));
	}

	#[test]
	fn test_merge_fills_absent_section() {
		let mut base = ReporterConfigLayer::default();
		base.merge(ReporterConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		});
		assert_eq!(base.database.unwrap().url.as_deref(), Some("sqlite::memory:"));
	}
}
