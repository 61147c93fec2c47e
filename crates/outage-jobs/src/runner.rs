// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-run execution: the job races its timeout and its cancellation
//! token.

use chrono::Utc;
use tracing::{info, warn};

use crate::context::{CancellationToken, JobContext};
use crate::error::JobError;
use crate::job::Job;
use crate::types::{JobOutput, JobRun, JobStatus, TriggerSource};

/// Runs `job` until it finishes, `ctx` is cancelled, or `job.timeout()`
/// elapses, whichever happens first.
///
/// Cancellation is checked before the other branches, so a run that is
/// cancelled and finishes in the same poll reports `Cancelled`. When the
/// job loses the race its future is dropped, and on timeout the context's
/// token is cancelled as well.
/// Work the job has handed to a spawned task is not dropped with it.
pub async fn run_guarded(job: &dyn Job, ctx: &JobContext) -> Result<JobOutput, JobError> {
	let timeout = job.timeout();
	let token = ctx.cancellation_token.clone();

	tokio::select! {
		biased;

		_ = token.cancelled() => Err(JobError::Cancelled),
		_ = tokio::time::sleep(timeout) => {
			token.cancel();
			Err(JobError::TimedOut(timeout))
		}
		result = job.run(ctx) => result,
	}
}

/// Runs `job` once under [`run_guarded`] and describes the run.
pub async fn execute(
	job: &dyn Job,
	triggered_by: TriggerSource,
	cancellation_token: CancellationToken,
) -> (JobRun, Result<JobOutput, JobError>) {
	let ctx = JobContext::new(triggered_by, cancellation_token);
	let started_at = Utc::now();

	info!(job_id = %job.id(), run_id = %ctx.run_id, triggered_by = triggered_by.as_str(), "Job started");

	let result = run_guarded(job, &ctx).await;

	let completed_at = Utc::now();
	let (status, error_message, metadata) = match &result {
		Ok(output) => {
			info!(job_id = %job.id(), run_id = %ctx.run_id, message = %output.message, "Job completed successfully");
			(JobStatus::Succeeded, None, output.metadata.clone())
		}
		Err(JobError::Cancelled) => {
			info!(job_id = %job.id(), run_id = %ctx.run_id, "Job cancelled");
			(JobStatus::Cancelled, None, None)
		}
		Err(e @ JobError::TimedOut(_)) => {
			warn!(job_id = %job.id(), run_id = %ctx.run_id, error = %e, "Job timed out");
			(JobStatus::TimedOut, Some(e.to_string()), None)
		}
		Err(e) => {
			warn!(job_id = %job.id(), run_id = %ctx.run_id, error = %e, "Job failed");
			(JobStatus::Failed, Some(e.to_string()), None)
		}
	};

	let run = JobRun {
		id: ctx.run_id,
		job_id: job.id().to_string(),
		status,
		started_at,
		completed_at: Some(completed_at),
		duration_ms: Some((completed_at - started_at).num_milliseconds()),
		error_message,
		triggered_by,
		metadata,
	};

	(run, result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicBool, Ordering};
	use std::sync::Arc;
	use std::time::Duration;

	/// Sleeps for `work` and then succeeds, recording whether it got that far.
	struct SleepyJob {
		work: Duration,
		timeout: Duration,
		finished: Arc<AtomicBool>,
	}

	impl SleepyJob {
		fn new(work: Duration, timeout: Duration) -> Self {
			Self {
				work,
				timeout,
				finished: Arc::new(AtomicBool::new(false)),
			}
		}
	}

	#[async_trait]
	impl Job for SleepyJob {
		fn id(&self) -> &str {
			"sleepy"
		}

		fn name(&self) -> &str {
			"Sleepy Job"
		}

		fn description(&self) -> &str {
			"Sleeps, then succeeds"
		}

		fn schedule(&self) -> &str {
			"0 0 6 * * *"
		}

		fn timeout(&self) -> Duration {
			self.timeout
		}

		async fn run(&self, _ctx: &JobContext) -> Result<JobOutput, JobError> {
			tokio::time::sleep(self.work).await;
			self.finished.store(true, Ordering::SeqCst);
			Ok(JobOutput {
				message: "done".to_string(),
				metadata: Some(serde_json::json!({ "slept_ms": self.work.as_millis() as u64 })),
			})
		}
	}

	struct FailingJob;

	#[async_trait]
	impl Job for FailingJob {
		fn id(&self) -> &str {
			"failing"
		}

		fn name(&self) -> &str {
			"Failing Job"
		}

		fn description(&self) -> &str {
			"Always fails"
		}

		fn schedule(&self) -> &str {
			"0 0 6 * * *"
		}

		async fn run(&self, _ctx: &JobContext) -> Result<JobOutput, JobError> {
			Err(JobError::failed("upstream unreachable"))
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_completes_within_timeout() {
		let job = SleepyJob::new(Duration::from_secs(1), Duration::from_secs(30));
		let ctx = JobContext::new(TriggerSource::Manual, CancellationToken::new());

		let output = run_guarded(&job, &ctx).await.unwrap();

		assert_eq!(output.message, "done");
		assert!(job.finished.load(Ordering::SeqCst));
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_wins_and_cancels_token() {
		let job = SleepyJob::new(Duration::from_secs(60), Duration::from_secs(30));
		let ctx = JobContext::new(TriggerSource::Schedule, CancellationToken::new());

		let err = run_guarded(&job, &ctx).await.unwrap_err();

		assert!(matches!(err, JobError::TimedOut(d) if d == Duration::from_secs(30)));
		assert!(ctx.cancellation_token.is_cancelled());
		assert!(!job.finished.load(Ordering::SeqCst));
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancellation_wins_over_work() {
		let job = SleepyJob::new(Duration::from_secs(10), Duration::from_secs(30));
		let token = CancellationToken::new();
		let ctx = JobContext::new(TriggerSource::Schedule, token.clone());

		let canceller = tokio::spawn(async move {
			tokio::time::sleep(Duration::from_secs(1)).await;
			token.cancel();
		});

		let err = run_guarded(&job, &ctx).await.unwrap_err();
		canceller.await.unwrap();

		assert!(matches!(err, JobError::Cancelled));
		assert!(!job.finished.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn test_already_cancelled_never_completes() {
		let job = SleepyJob::new(Duration::ZERO, Duration::from_secs(30));
		let token = CancellationToken::new();
		token.cancel();
		let ctx = JobContext::new(TriggerSource::Manual, token);

		let err = run_guarded(&job, &ctx).await.unwrap_err();

		assert!(matches!(err, JobError::Cancelled));
		assert!(!job.finished.load(Ordering::SeqCst));
	}

	#[tokio::test(start_paused = true)]
	async fn test_execute_describes_successful_run() {
		let job = SleepyJob::new(Duration::from_millis(250), Duration::from_secs(30));

		let (run, result) = execute(&job, TriggerSource::Manual, CancellationToken::new()).await;

		assert!(result.is_ok());
		assert_eq!(run.job_id, "sleepy");
		assert_eq!(run.status, JobStatus::Succeeded);
		assert_eq!(run.triggered_by, TriggerSource::Manual);
		assert!(run.error_message.is_none());
		assert_eq!(run.metadata.unwrap()["slept_ms"], 250);
	}

	#[tokio::test]
	async fn test_execute_records_failure_message() {
		let (run, result) = execute(&FailingJob, TriggerSource::Schedule, CancellationToken::new()).await;

		assert!(matches!(result, Err(JobError::Failed { .. })));
		assert_eq!(run.status, JobStatus::Failed);
		assert_eq!(
			run.error_message.as_deref(),
			Some("Job failed: upstream unreachable")
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_execute_records_timeout() {
		let job = SleepyJob::new(Duration::from_secs(60), Duration::from_secs(5));

		let (run, _) = execute(&job, TriggerSource::Schedule, CancellationToken::new()).await;

		assert_eq!(run.status, JobStatus::TimedOut);
	}
}
