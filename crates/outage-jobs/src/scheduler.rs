// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::CancellationToken;
use crate::error::{JobError, Result};
use crate::health::{
	determine_health_state, HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo,
	RunHistory,
};
use crate::job::Job;
use crate::runner::execute;
use crate::schedule::{next_fire, parse_schedule};
use crate::types::{JobOutput, JobRun, TriggerSource};
use chrono::Utc;
use cron::Schedule;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

struct RegisteredJob {
	job: Arc<dyn Job>,
	schedule: Schedule,
	cancellation_token: CancellationToken,
	history: Arc<Mutex<RunHistory>>,
}

/// Runs registered jobs on their cron schedules.
///
/// Each job gets one task that sleeps until the next fire time and then
/// runs the job to completion before computing the following fire time, so
/// runs of the same job never overlap. Every run gets a child of the job's
/// token, which is itself a child of the scheduler's shutdown token.
pub struct JobScheduler {
	jobs: HashMap<String, RegisteredJob>,
	shutdown_token: CancellationToken,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
	pub fn new() -> Self {
		Self {
			jobs: HashMap::new(),
			shutdown_token: CancellationToken::new(),
			handles: Mutex::new(Vec::new()),
		}
	}

	/// Registers a job under its own schedule.
	///
	/// # Errors
	///
	/// Returns `JobError::InvalidSchedule` if the job's cron expression does
	/// not parse.
	pub fn register(&mut self, job: Arc<dyn Job>) -> Result<()> {
		let schedule = parse_schedule(job.schedule())?;
		let id = job.id().to_string();
		info!(job_id = %id, schedule = job.schedule(), timeout_secs = job.timeout().as_secs(), "Registered job");
		self.jobs.insert(
			id,
			RegisteredJob {
				job,
				schedule,
				cancellation_token: self.shutdown_token.child_token(),
				history: Arc::new(Mutex::new(RunHistory::default())),
			},
		);
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn start(&self) -> Result<()> {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			let job = Arc::clone(&registered.job);
			let schedule = registered.schedule.clone();
			let history = Arc::clone(&registered.history);
			let shutdown_token = self.shutdown_token.clone();
			let cancellation_token = registered.cancellation_token.clone();
			let job_id = job_id.clone();

			let handle = tokio::spawn(async move {
				loop {
					let now = Utc::now();
					let Some(next) = next_fire(&schedule, now) else {
						warn!(job_id = %job_id, "Schedule has no future fire time");
						break;
					};
					let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
					info!(job_id = %job_id, next_run = %next, "Next run scheduled");

					tokio::select! {
						_ = tokio::time::sleep(wait) => {
							if cancellation_token.is_cancelled() {
								info!(job_id = %job_id, "Job cancelled, no longer scheduling");
								break;
							}
							let (run, _) = execute(
								job.as_ref(),
								TriggerSource::Schedule,
								cancellation_token.child_token(),
							)
							.await;
							record_run(&history, run).await;
						}
						_ = shutdown_token.cancelled() => {
							info!(job_id = %job_id, "Shutting down scheduled job");
							break;
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "Job scheduler started");
		Ok(())
	}

	/// Runs a job once, immediately, outside its schedule.
	#[instrument(skip(self))]
	pub async fn trigger_job(&self, job_id: &str, triggered_by: TriggerSource) -> Result<JobOutput> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		let (run, result) = execute(
			registered.job.as_ref(),
			triggered_by,
			registered.cancellation_token.child_token(),
		)
		.await;
		record_run(&registered.history, run).await;
		result
	}

	/// Cancels any in-flight run of the job and stops scheduling it.
	#[instrument(skip(self))]
	pub async fn cancel_job(&self, job_id: &str) -> Result<()> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		registered.cancellation_token.cancel();
		Ok(())
	}

	/// Cancels in-flight runs and waits for the job tasks to exit.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		self.shutdown_token.cancel();

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("Job scheduler shut down");
	}

	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.keys().cloned().collect()
	}

	#[instrument(skip(self))]
	pub async fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;
		let history = registered.history.lock().await;

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.job.name().to_string(),
			status: determine_health_state(&history.last_run, history.consecutive_failures),
			last_run: history.last_run.as_ref().map(LastRunInfo::from),
			next_run: next_fire(&registered.schedule, Utc::now()),
			consecutive_failures: history.consecutive_failures,
		})
	}

	#[instrument(skip(self))]
	pub async fn health_status(&self) -> JobsHealthStatus {
		let mut jobs = Vec::new();
		let mut worst_state = HealthState::Healthy;

		for job_id in self.jobs.keys() {
			if let Some(status) = self.job_status(job_id).await {
				if status.status == HealthState::Unhealthy {
					worst_state = HealthState::Unhealthy;
				} else if status.status == HealthState::Degraded && worst_state != HealthState::Unhealthy {
					worst_state = HealthState::Degraded;
				}
				jobs.push(status);
			}
		}

		JobsHealthStatus {
			status: worst_state,
			jobs,
		}
	}
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

async fn record_run(history: &Mutex<RunHistory>, run: JobRun) {
	let mut history = history.lock().await;
	history.record(run);
	if history.consecutive_failures > 0 {
		warn!(
			consecutive_failures = history.consecutive_failures,
			"Job has failed on consecutive runs"
		);
	}
}
