// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("Job not found: {0}")]
	NotFound(String),

	#[error("Job cancelled")]
	Cancelled,

	#[error("Job timed out after {0:?}")]
	TimedOut(Duration),

	#[error("Job failed: {message}")]
	Failed { message: String },

	#[error("Invalid schedule {expression:?}: {message}")]
	InvalidSchedule { expression: String, message: String },
}

impl JobError {
	pub fn failed(message: impl Into<String>) -> Self {
		JobError::Failed {
			message: message.into(),
		}
	}
}

pub type Result<T> = std::result::Result<T, JobError>;
