// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivers new outages to the RSS webhook.
//!
//! Each outage becomes a single-entry JSON list `[{title, body, url}]`
//! POSTed to the webhook. Only `200 OK` counts as delivered; nothing is
//! retried here.

use async_trait::async_trait;
use outage_feed::OutageRecord;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const TITLE_PREFIX: &str = "Virgin Media outage";

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
	#[error("Webhook request failed: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("Webhook returned {0}, expected 200 OK")]
	UnexpectedStatus(StatusCode),

	#[error("Failed to serialize outage: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

/// One entry of the RSS webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RssEntry {
	pub title: String,
	pub body: String,
	pub url: String,
}

impl RssEntry {
	pub fn for_outage(outage: &OutageRecord) -> Result<Self> {
		Ok(Self {
			title: format!("{TITLE_PREFIX}: {}", outage.id),
			body: outage.to_pretty_json()?,
			url: String::new(),
		})
	}
}

/// Sink for new-outage notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
	async fn notify(&self, outage: &OutageRecord) -> Result<()>;
}

/// Posts outages to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
	client: Client,
	endpoint: String,
}

impl WebhookNotifier {
	pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
		Self {
			client,
			endpoint: endpoint.into(),
		}
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

#[async_trait]
impl Notifier for WebhookNotifier {
	#[instrument(skip(self, outage), fields(outage_id = %outage.id))]
	async fn notify(&self, outage: &OutageRecord) -> Result<()> {
		let payload = serde_json::to_vec(&[RssEntry::for_outage(outage)?])?;

		let response = self
			.client
			.post(&self.endpoint)
			.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
			.body(payload)
			.send()
			.await?;

		let status = response.status();
		if status != StatusCode::OK {
			tracing::warn!(status = status.as_u16(), "webhook rejected outage");
			return Err(NotifyError::UnexpectedStatus(status));
		}

		tracing::info!("outage delivered to webhook");
		Ok(())
	}
}
