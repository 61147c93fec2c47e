// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for notified outages.
//!
//! The `outages` table is an append-only set keyed by the upstream outage id.
//! A row is written once, after the outage has been delivered, and is never
//! updated or deleted.

pub mod error;
pub mod outage;
pub mod pool;
pub mod testing;

pub use error::{DbError, Result};
pub use outage::{OutageRepository, SqliteOutageRepository, StoredOutage};
pub use pool::{create_pool, run_migrations};
