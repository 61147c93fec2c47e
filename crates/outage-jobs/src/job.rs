// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use async_trait::async_trait;

use crate::context::JobContext;
use crate::error::JobError;
use crate::types::JobOutput;

/// Wall-clock budget for a single run unless the job overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Job: Send + Sync {
	fn id(&self) -> &str;

	fn name(&self) -> &str;

	fn description(&self) -> &str;

	/// Cron expression, either 6-field (`sec min hour dom month dow`) or
	/// 5-field Unix form.
	fn schedule(&self) -> &str;

	fn timeout(&self) -> Duration {
		DEFAULT_TIMEOUT
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError>;
}
