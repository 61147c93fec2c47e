// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

/// Format of `estimatedResolutionDate` in the feed. The feed carries no zone
/// marker; the parsed value is labelled UTC as-is.
pub const RESOLUTION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A normalized outage report.
///
/// `id` is the only identity used for deduplication. The serialized form
/// (camelCase keys) is what the notifier sends and the dedup store keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageRecord {
	pub id: String,
	pub description: String,
	pub status: String,
	pub kind: String,
	pub ticket_number: String,
	pub estimated_resolution_time: DateTime<Utc>,
}

impl OutageRecord {
	/// Pretty-printed JSON used as the webhook body and the stored blob.
	pub fn to_pretty_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}

/// Parses a feed timestamp as naive time and labels it UTC.
pub(crate) fn parse_resolution_date(value: &str) -> Result<DateTime<Utc>> {
	NaiveDateTime::parse_from_str(value, RESOLUTION_DATE_FORMAT)
		.map(|naive| naive.and_utc())
		.map_err(|source| FeedError::Timestamp {
			value: value.to_string(),
			source,
		})
}
