// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed schema for the session-data document.
//!
//! Outages live at
//! `care2Session.serviceStatusResponse.currentOutagesByProductType.BROADBAND.outages`.
//! Every level is optional: a missing (or `null`) level means "no outages".
//! A level that is present with the wrong JSON type fails deserialization.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{FeedError, Result};
use crate::record::{parse_resolution_date, OutageRecord};

#[derive(Debug, Deserialize)]
struct SessionData {
	#[serde(rename = "care2Session", default)]
	care2_session: Option<Care2Session>,
}

#[derive(Debug, Deserialize)]
struct Care2Session {
	#[serde(rename = "serviceStatusResponse", default)]
	service_status_response: Option<ServiceStatusResponse>,
}

#[derive(Debug, Deserialize)]
struct ServiceStatusResponse {
	#[serde(rename = "currentOutagesByProductType", default)]
	current_outages_by_product_type: Option<OutagesByProductType>,
}

#[derive(Debug, Deserialize)]
struct OutagesByProductType {
	#[serde(rename = "BROADBAND", default)]
	broadband: Option<ProductOutages>,
}

#[derive(Debug, Deserialize)]
struct ProductOutages {
	#[serde(default)]
	outages: Option<Vec<RawOutage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOutage {
	outage_id: String,
	description: String,
	outage_status: String,
	outage_type: String,
	ticket_number: String,
	estimated_resolution_date: String,
}

impl SessionData {
	fn into_outages(self) -> Option<Vec<RawOutage>> {
		self.care2_session?
			.service_status_response?
			.current_outages_by_product_type?
			.broadband?
			.outages
	}
}

impl TryFrom<RawOutage> for OutageRecord {
	type Error = FeedError;

	fn try_from(raw: RawOutage) -> Result<Self> {
		Ok(OutageRecord {
			estimated_resolution_time: parse_resolution_date(&raw.estimated_resolution_date)?,
			id: raw.outage_id,
			description: raw.description,
			status: raw.outage_status,
			kind: raw.outage_type,
			ticket_number: raw.ticket_number,
		})
	}
}

/// Extracts the broadband outages from a session-data response body.
///
/// Returns an empty list when the outage path is absent. Any other problem
/// (invalid JSON, a mistyped level, a missing field, a bad timestamp, an
/// empty or repeated id) fails the whole batch.
pub fn extract_outages(body: &[u8]) -> Result<Vec<OutageRecord>> {
	let document: SessionData = serde_json::from_slice(body)?;

	let Some(raw_outages) = document.into_outages() else {
		tracing::debug!("outage path not present in feed document");
		return Ok(Vec::new());
	};

	let mut seen = HashSet::with_capacity(raw_outages.len());
	let mut outages = Vec::with_capacity(raw_outages.len());
	for raw in raw_outages {
		let outage = OutageRecord::try_from(raw)?;
		if outage.id.is_empty() {
			return Err(FeedError::InvalidRecord("outageId is empty".to_string()));
		}
		if !seen.insert(outage.id.clone()) {
			return Err(FeedError::InvalidRecord(format!(
				"outageId {} appears more than once",
				outage.id
			)));
		}
		outages.push(outage);
	}

	Ok(outages)
}
