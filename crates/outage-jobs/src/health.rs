// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::{JobRun, JobStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct JobHealthStatus {
	pub job_id: String,
	pub name: String,
	pub status: HealthState,
	pub last_run: Option<LastRunInfo>,
	pub next_run: Option<DateTime<Utc>>,
	pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRunInfo {
	pub run_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub duration_ms: Option<i64>,
	pub error: Option<String>,
}

impl From<&JobRun> for LastRunInfo {
	fn from(run: &JobRun) -> Self {
		Self {
			run_id: run.id.clone(),
			status: run.status,
			started_at: run.started_at,
			duration_ms: run.duration_ms,
			error: run.error_message.clone(),
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsHealthStatus {
	pub status: HealthState,
	pub jobs: Vec<JobHealthStatus>,
}

/// Last run plus the failure streak that ends with it.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunHistory {
	pub last_run: Option<JobRun>,
	pub consecutive_failures: u32,
}

impl RunHistory {
	pub fn record(&mut self, run: JobRun) {
		match run.status {
			JobStatus::Failed | JobStatus::TimedOut => self.consecutive_failures += 1,
			JobStatus::Succeeded => self.consecutive_failures = 0,
			JobStatus::Running | JobStatus::Cancelled => {}
		}
		self.last_run = Some(run);
	}
}

pub(crate) fn determine_health_state(last_run: &Option<JobRun>, consecutive_failures: u32) -> HealthState {
	match last_run {
		None => HealthState::Healthy,
		Some(run) => match run.status {
			JobStatus::Succeeded => HealthState::Healthy,
			JobStatus::Running => HealthState::Healthy,
			JobStatus::Cancelled => HealthState::Healthy,
			JobStatus::Failed | JobStatus::TimedOut => {
				if consecutive_failures >= 3 {
					HealthState::Unhealthy
				} else if consecutive_failures >= 1 {
					HealthState::Degraded
				} else {
					HealthState::Healthy
				}
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::TriggerSource;

	fn run(status: JobStatus) -> JobRun {
		JobRun {
			id: "run-1".to_string(),
			job_id: "check".to_string(),
			status,
			started_at: Utc::now(),
			completed_at: Some(Utc::now()),
			duration_ms: Some(100),
			error_message: None,
			triggered_by: TriggerSource::Schedule,
			metadata: None,
		}
	}

	#[test]
	fn test_no_last_run_is_healthy() {
		assert_eq!(determine_health_state(&None, 0), HealthState::Healthy);
	}

	#[test]
	fn test_failure_streak_degrades_then_unhealthy() {
		let mut history = RunHistory::default();

		history.record(run(JobStatus::Failed));
		assert_eq!(
			determine_health_state(&history.last_run, history.consecutive_failures),
			HealthState::Degraded
		);

		history.record(run(JobStatus::TimedOut));
		history.record(run(JobStatus::Failed));
		assert_eq!(history.consecutive_failures, 3);
		assert_eq!(
			determine_health_state(&history.last_run, history.consecutive_failures),
			HealthState::Unhealthy
		);
	}

	#[test]
	fn test_success_resets_streak() {
		let mut history = RunHistory::default();
		history.record(run(JobStatus::Failed));
		history.record(run(JobStatus::Succeeded));

		assert_eq!(history.consecutive_failures, 0);
		assert_eq!(
			determine_health_state(&history.last_run, history.consecutive_failures),
			HealthState::Healthy
		);
	}

	#[test]
	fn test_cancelled_run_keeps_streak_but_is_healthy() {
		let mut history = RunHistory::default();
		history.record(run(JobStatus::Failed));
		history.record(run(JobStatus::Cancelled));

		assert_eq!(history.consecutive_failures, 1);
		assert_eq!(
			determine_health_state(&history.last_run, history.consecutive_failures),
			HealthState::Healthy
		);
	}
}
