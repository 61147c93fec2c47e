// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for the session-data endpoint.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tracing::instrument;

use crate::error::{FeedError, Result};
use crate::record::OutageRecord;
use crate::wire::extract_outages;

/// Path of the session-data document, relative to the configured endpoint.
pub const SESSION_DATA_PATH: &str = "/rou-compax/v2/session-data";

/// The status page only answers browsers, so the client presents as Safari.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.1 Safari/605.1.15";

/// Fetches current outages from the status feed.
///
/// Caller headers are sent on every request and take precedence over the
/// client defaults, including the User-Agent.
#[derive(Debug, Clone)]
pub struct FeedClient {
	client: Client,
	url: String,
	headers: HeaderMap,
}

impl FeedClient {
	/// Creates a client for `endpoint` with the given request headers.
	///
	/// # Errors
	/// Returns `FeedError::InvalidHeader` if a header name or value is not
	/// valid HTTP, and `FeedError::Transport` if the client cannot be built.
	pub fn new(endpoint: &str, headers: &BTreeMap<String, String>) -> Result<Self> {
		let client = builder().build()?;
		Self::with_client(client, endpoint, headers)
	}

	/// Creates a client around an existing `reqwest::Client`.
	pub fn with_client(
		client: Client,
		endpoint: &str,
		headers: &BTreeMap<String, String>,
	) -> Result<Self> {
		Ok(Self {
			client,
			url: format!("{}{}", endpoint.trim_end_matches('/'), SESSION_DATA_PATH),
			headers: header_map(headers)?,
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// Fetches the session-data document and returns its broadband outages.
	///
	/// An absent outage path yields an empty list. Everything else is all or
	/// nothing: a transport failure, a non-success status or any malformed
	/// entry fails the call.
	#[instrument(skip(self), fields(url = %self.url))]
	pub async fn fetch_outages(&self) -> Result<Vec<OutageRecord>> {
		let response = self
			.client
			.get(&self.url)
			.headers(self.headers.clone())
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(FeedError::Status(status));
		}

		let body = response.bytes().await?;
		let outages = extract_outages(&body)?;

		tracing::debug!(count = outages.len(), "fetched outages");
		Ok(outages)
	}
}

/// Source of the current outage list.
#[async_trait]
pub trait OutageFeed: Send + Sync {
	async fn fetch_outages(&self) -> Result<Vec<OutageRecord>>;
}

#[async_trait]
impl OutageFeed for FeedClient {
	async fn fetch_outages(&self) -> Result<Vec<OutageRecord>> {
		FeedClient::fetch_outages(self).await
	}
}

/// Client builder carrying the browser User-Agent.
fn builder() -> ClientBuilder {
	Client::builder().user_agent(BROWSER_USER_AGENT)
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
	let mut map = HeaderMap::with_capacity(headers.len());
	for (name, value) in headers {
		let header_name =
			HeaderName::from_bytes(name.as_bytes()).map_err(|e| FeedError::InvalidHeader {
				name: name.clone(),
				message: e.to_string(),
			})?;
		let header_value = HeaderValue::from_str(value).map_err(|e| FeedError::InvalidHeader {
			name: name.clone(),
			message: e.to_string(),
		})?;
		map.insert(header_name, header_value);
	}
	Ok(map)
}
