// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use outage_db::OutageRepository;
use outage_feed::{OutageFeed, OutageRecord};
use outage_jobs::{Job, JobContext, JobError, JobOutput, DEFAULT_TIMEOUT};
use outage_notify::Notifier;
use tracing::{info, instrument};

pub const CHECK_JOB_ID: &str = "check";
pub const CHECK_JOB_NAME: &str = "Virgin Media Outage Check";

const DEFAULT_SCHEDULE: &str = "0 0 6 * * *";

/// Pipeline stage of a check run, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
	Fetching,
	Filtering,
	Notifying,
	Persisting,
	Done,
}

impl CheckState {
	pub fn as_str(&self) -> &'static str {
		match self {
			CheckState::Fetching => "fetching",
			CheckState::Filtering => "filtering",
			CheckState::Notifying => "notifying",
			CheckState::Persisting => "persisting",
			CheckState::Done => "done",
		}
	}
}

/// Fetches current outages, notifies the webhook about ones not seen before
/// and records them.
///
/// An outage is recorded only after every new outage in the run has been
/// delivered, so a failed delivery leaves the whole batch to be retried on the
/// next run. A failure after delivery but before the write commits means the
/// batch is delivered again next time.
///
/// The write itself is shielded: a run cancelled or timed out while it is in
/// flight reports that outcome, but the batch still commits as one statement
/// and the next run sees it as known.
pub struct CheckJob {
	feed: Arc<dyn OutageFeed>,
	notifier: Arc<dyn Notifier>,
	store: Arc<dyn OutageRepository>,
	schedule: String,
	timeout: Duration,
}

impl CheckJob {
	pub fn new(
		feed: Arc<dyn OutageFeed>,
		notifier: Arc<dyn Notifier>,
		store: Arc<dyn OutageRepository>,
	) -> Self {
		Self {
			feed,
			notifier,
			store,
			schedule: DEFAULT_SCHEDULE.to_string(),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
		self.schedule = schedule.into();
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

fn enter(state: CheckState) {
	info!(state = state.as_str(), "Check state");
}

fn summary(fetched: usize, new: usize, notified: usize, recorded: usize) -> JobOutput {
	let message = match (fetched, new) {
		(0, _) => "No current outages".to_string(),
		(_, 0) => format!("No new outages among {fetched} current"),
		_ => format!("Notified and recorded {recorded} new outages"),
	};

	JobOutput {
		message,
		metadata: Some(serde_json::json!({
			"fetched": fetched,
			"new": new,
			"notified": notified,
			"recorded": recorded,
		})),
	}
}

#[async_trait]
impl Job for CheckJob {
	fn id(&self) -> &str {
		CHECK_JOB_ID
	}

	fn name(&self) -> &str {
		CHECK_JOB_NAME
	}

	fn description(&self) -> &str {
		"Post new Virgin Media broadband outages to the RSS webhook"
	}

	fn schedule(&self) -> &str {
		&self.schedule
	}

	fn timeout(&self) -> Duration {
		self.timeout
	}

	#[instrument(skip(self, ctx), fields(job_id = CHECK_JOB_ID, run_id = %ctx.run_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.ensure_active()?;

		enter(CheckState::Fetching);
		let fetched = self
			.feed
			.fetch_outages()
			.await
			.map_err(|e| JobError::failed(format!("fetching outages: {e}")))?;
		let fetched_count = fetched.len();
		if fetched.is_empty() {
			enter(CheckState::Done);
			return Ok(summary(0, 0, 0, 0));
		}

		enter(CheckState::Filtering);
		let ids: Vec<String> = fetched.iter().map(|o| o.id.clone()).collect();
		let existing = self
			.store
			.find_existing(&ids)
			.await
			.map_err(|e| JobError::failed(format!("looking up known outages: {e}")))?;
		let new: Vec<OutageRecord> = fetched
			.into_iter()
			.filter(|o| !existing.contains(&o.id))
			.collect();
		info!(fetched = fetched_count, new = new.len(), "Filtered known outages");
		if new.is_empty() {
			enter(CheckState::Done);
			return Ok(summary(fetched_count, 0, 0, 0));
		}

		enter(CheckState::Notifying);
		for outage in &new {
			ctx.ensure_active()?;
			self.notifier.notify(outage).await.map_err(|e| {
				JobError::failed(format!("notifying outage {}: {e}", outage.id))
			})?;
		}

		enter(CheckState::Persisting);
		ctx.ensure_active()?;
		// Once started the write runs to completion on its own task, even if
		// this run is cancelled or times out while awaiting it.
		let store = Arc::clone(&self.store);
		let batch = new.clone();
		tokio::spawn(async move { store.record_all(&batch).await })
			.await
			.map_err(|e| JobError::failed(format!("recording outages: {e}")))?
			.map_err(|e| JobError::failed(format!("recording outages: {e}")))?;

		enter(CheckState::Done);
		info!(fetched = fetched_count, new = new.len(), "Check completed");
		Ok(summary(fetched_count, new.len(), new.len(), new.len()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use outage_db::{DbError, StoredOutage};
	use outage_feed::FeedError;
	use outage_jobs::{run_guarded, CancellationToken, TriggerSource};
	use std::collections::HashSet;
	use std::sync::Mutex;

	fn outage(id: &str) -> OutageRecord {
		use chrono::TimeZone;
		OutageRecord {
			id: id.to_string(),
			description: format!("outage {id}"),
			status: "Investigating".to_string(),
			kind: "CHANGE".to_string(),
			ticket_number: format!("C{id}"),
			estimated_resolution_time: chrono::Utc
				.with_ymd_and_hms(2022, 11, 14, 15, 0, 0)
				.unwrap(),
		}
	}

	struct StaticFeed(Vec<OutageRecord>);

	#[async_trait]
	impl OutageFeed for StaticFeed {
		async fn fetch_outages(&self) -> outage_feed::Result<Vec<OutageRecord>> {
			Ok(self.0.clone())
		}
	}

	struct BrokenFeed;

	#[async_trait]
	impl OutageFeed for BrokenFeed {
		async fn fetch_outages(&self) -> outage_feed::Result<Vec<OutageRecord>> {
			Err(FeedError::InvalidRecord("outage has an empty id".to_string()))
		}
	}

	#[derive(Default)]
	struct RecordingNotifier {
		delivered: Mutex<Vec<String>>,
	}

	#[async_trait]
	impl Notifier for RecordingNotifier {
		async fn notify(&self, outage: &OutageRecord) -> outage_notify::Result<()> {
			self.delivered.lock().unwrap().push(outage.id.clone());
			Ok(())
		}
	}

	#[derive(Default)]
	struct MemoryStore {
		known: Mutex<Vec<String>>,
		lookups: Mutex<u32>,
		fail_lookups: bool,
		fail_writes: bool,
		write_delay: Option<Duration>,
	}

	impl MemoryStore {
		fn with(ids: &[&str]) -> Self {
			Self {
				known: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
				..Self::default()
			}
		}
	}

	#[async_trait]
	impl OutageRepository for MemoryStore {
		async fn find_existing(&self, ids: &[String]) -> outage_db::Result<HashSet<String>> {
			*self.lookups.lock().unwrap() += 1;
			if self.fail_lookups {
				return Err(DbError::Internal("database is locked".to_string()));
			}
			let known = self.known.lock().unwrap();
			Ok(ids.iter().filter(|id| known.contains(id)).cloned().collect())
		}

		async fn record_all(&self, outages: &[OutageRecord]) -> outage_db::Result<()> {
			if let Some(delay) = self.write_delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail_writes {
				return Err(DbError::Internal("disk I/O error".to_string()));
			}
			let mut known = self.known.lock().unwrap();
			if outages.iter().any(|o| known.contains(&o.id)) {
				return Err(DbError::Conflict("Outage already recorded".to_string()));
			}
			known.extend(outages.iter().map(|o| o.id.clone()));
			Ok(())
		}

		async fn count(&self) -> outage_db::Result<i64> {
			Ok(self.known.lock().unwrap().len() as i64)
		}

		async fn get_outage(&self, _outage_id: &str) -> outage_db::Result<Option<StoredOutage>> {
			Ok(None)
		}

		async fn list_recent(&self, _limit: u32) -> outage_db::Result<Vec<StoredOutage>> {
			Ok(Vec::new())
		}
	}

	fn ctx() -> JobContext {
		JobContext::new(TriggerSource::Manual, CancellationToken::new())
	}

	#[test]
	fn test_metadata() {
		let job = CheckJob::new(
			Arc::new(StaticFeed(Vec::new())),
			Arc::new(RecordingNotifier::default()),
			Arc::new(MemoryStore::default()),
		);
		assert_eq!(job.id(), "check");
		assert_eq!(job.name(), "Virgin Media Outage Check");
		assert_eq!(job.schedule(), "0 0 6 * * *");
		assert_eq!(job.timeout(), Duration::from_secs(30));

		let job = job
			.with_schedule("0 */15 * * * *")
			.with_timeout(Duration::from_secs(10));
		assert_eq!(job.schedule(), "0 */15 * * * *");
		assert_eq!(job.timeout(), Duration::from_secs(10));
	}

	#[tokio::test]
	async fn test_empty_fetch_skips_store() {
		let store = Arc::new(MemoryStore::default());
		let job = CheckJob::new(
			Arc::new(StaticFeed(Vec::new())),
			Arc::new(RecordingNotifier::default()),
			store.clone(),
		);

		let output = job.run(&ctx()).await.unwrap();

		assert_eq!(*store.lookups.lock().unwrap(), 0);
		assert_eq!(output.metadata.unwrap()["fetched"], 0);
	}

	#[tokio::test]
	async fn test_notifies_only_unknown_in_fetch_order() {
		let notifier = Arc::new(RecordingNotifier::default());
		let store = Arc::new(MemoryStore::with(&["B"]));
		let job = CheckJob::new(
			Arc::new(StaticFeed(vec![outage("C"), outage("B"), outage("A")])),
			notifier.clone(),
			store.clone(),
		);

		let output = job.run(&ctx()).await.unwrap();

		assert_eq!(*notifier.delivered.lock().unwrap(), vec!["C", "A"]);
		assert_eq!(store.count().await.unwrap(), 3);
		let metadata = output.metadata.unwrap();
		assert_eq!(metadata["fetched"], 3);
		assert_eq!(metadata["new"], 2);
		assert_eq!(metadata["notified"], 2);
		assert_eq!(metadata["recorded"], 2);
	}

	#[tokio::test]
	async fn test_feed_error_fails_run() {
		let job = CheckJob::new(
			Arc::new(BrokenFeed),
			Arc::new(RecordingNotifier::default()),
			Arc::new(MemoryStore::default()),
		);

		let err = job.run(&ctx()).await.unwrap_err();

		assert!(err.to_string().contains("fetching outages"));
	}

	#[tokio::test]
	async fn test_cancelled_before_start_does_nothing() {
		let notifier = Arc::new(RecordingNotifier::default());
		let job = CheckJob::new(
			Arc::new(StaticFeed(vec![outage("A")])),
			notifier.clone(),
			Arc::new(MemoryStore::default()),
		);
		let ctx = ctx();
		ctx.cancellation_token.cancel();

		assert!(matches!(job.run(&ctx).await, Err(JobError::Cancelled)));
		assert!(notifier.delivered.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_lookup_error_fails_before_notifying() {
		let notifier = Arc::new(RecordingNotifier::default());
		let job = CheckJob::new(
			Arc::new(StaticFeed(vec![outage("A")])),
			notifier.clone(),
			Arc::new(MemoryStore {
				fail_lookups: true,
				..MemoryStore::default()
			}),
		);

		let err = job.run(&ctx()).await.unwrap_err();

		assert!(err.to_string().contains("looking up known outages"));
		assert!(notifier.delivered.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_write_error_fails_after_notifying_all() {
		let notifier = Arc::new(RecordingNotifier::default());
		let store = Arc::new(MemoryStore {
			fail_writes: true,
			..MemoryStore::default()
		});
		let job = CheckJob::new(
			Arc::new(StaticFeed(vec![outage("A"), outage("B")])),
			notifier.clone(),
			store.clone(),
		);

		let err = job.run(&ctx()).await.unwrap_err();

		assert!(err.to_string().contains("recording outages"));
		assert_eq!(*notifier.delivered.lock().unwrap(), vec!["A", "B"]);
		assert_eq!(store.count().await.unwrap(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancel_during_write_still_commits_batch() {
		let store = Arc::new(MemoryStore {
			write_delay: Some(Duration::from_secs(1)),
			..MemoryStore::default()
		});
		let job = CheckJob::new(
			Arc::new(StaticFeed(vec![outage("A"), outage("B")])),
			Arc::new(RecordingNotifier::default()),
			store.clone(),
		);
		let ctx = ctx();
		let token = ctx.cancellation_token.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(100)).await;
			token.cancel();
		});

		let result = run_guarded(&job, &ctx).await;

		assert!(matches!(result, Err(JobError::Cancelled)));
		assert_eq!(store.count().await.unwrap(), 0);
		tokio::time::sleep(Duration::from_secs(2)).await;
		assert_eq!(store.count().await.unwrap(), 2);
	}
}
