// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
	#[error("Transport error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("Unexpected status from feed: {0}")]
	Status(reqwest::StatusCode),

	#[error("Malformed feed document: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid resolution date {value:?}: {source}")]
	Timestamp {
		value: String,
		#[source]
		source: chrono::ParseError,
	},

	#[error("Invalid outage record: {0}")]
	InvalidRecord(String),

	#[error("Invalid header {name:?}: {message}")]
	InvalidHeader { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, FeedError>;
