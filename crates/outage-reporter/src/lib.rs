// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Virgin Media outage reporter.
//!
//! Polls the service status feed on a schedule and posts every broadband
//! outage it has not reported before to an RSS webhook.

pub mod jobs;

use std::sync::Arc;

use outage_config::CheckConfig;
use outage_db::SqliteOutageRepository;
use outage_feed::{FeedClient, FeedError};
use outage_notify::WebhookNotifier;
use sqlx::SqlitePool;

pub use jobs::{CheckJob, CheckState};

/// Wires the check job to the live feed, the webhook and the database.
pub fn build_check_job(config: &CheckConfig, pool: SqlitePool) -> Result<CheckJob, FeedError> {
	let feed = FeedClient::new(&config.endpoint, &config.headers)?;
	let notifier = WebhookNotifier::new(
		reqwest::Client::builder().build()?,
		config.webhook_rss_endpoint.clone(),
	);

	Ok(CheckJob::new(
		Arc::new(feed),
		Arc::new(notifier),
		Arc::new(SqliteOutageRepository::new(pool)),
	)
	.with_schedule(config.schedule.clone())
	.with_timeout(config.timeout()))
}
