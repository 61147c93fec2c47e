// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the Virgin Media service status feed.
//!
//! This crate provides:
//! - [`FeedClient`]: fetches the session-data document and extracts the
//!   current broadband outages
//! - [`OutageRecord`]: the normalized outage shape shared by the notifier and
//!   the dedup store
//! - A typed schema for the upstream document, where a missing outage path is
//!   an empty result and a mistyped one is an error

mod client;
mod error;
mod record;
mod wire;

pub use client::{FeedClient, OutageFeed, BROWSER_USER_AGENT, SESSION_DATA_PATH};
pub use error::{FeedError, Result};
pub use record::{OutageRecord, RESOLUTION_DATE_FORMAT};
pub use wire::extract_outages;
