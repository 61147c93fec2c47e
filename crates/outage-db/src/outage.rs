// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository for the set of already-notified outages.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use outage_feed::OutageRecord;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::error::{DbError, Result};

/// A persisted outage row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredOutage {
	pub outage_id: String,
	pub data: String,
	pub created_at: String,
}

/// Repository trait for notified outages.
#[async_trait]
pub trait OutageRepository: Send + Sync {
	/// Returns the subset of `ids` that is already recorded, in one query.
	async fn find_existing(&self, ids: &[String]) -> Result<HashSet<String>>;

	/// Records every outage in one atomic write.
	///
	/// Fails with `DbError::Conflict`, inserting nothing, if any id is already
	/// recorded or repeats within `outages`.
	async fn record_all(&self, outages: &[OutageRecord]) -> Result<()>;

	async fn count(&self) -> Result<i64>;

	async fn get_outage(&self, outage_id: &str) -> Result<Option<StoredOutage>>;

	/// Most recently recorded outages, newest first.
	async fn list_recent(&self, limit: u32) -> Result<Vec<StoredOutage>>;
}

/// SQLite implementation of the outage repository.
#[derive(Clone)]
pub struct SqliteOutageRepository {
	pool: SqlitePool,
}

impl SqliteOutageRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl OutageRepository for SqliteOutageRepository {
	#[instrument(skip(self, ids), fields(count = ids.len()))]
	async fn find_existing(&self, ids: &[String]) -> Result<HashSet<String>> {
		if ids.is_empty() {
			return Ok(HashSet::new());
		}

		let mut builder =
			QueryBuilder::<Sqlite>::new("SELECT outage_id FROM outages WHERE outage_id IN (");
		let mut separated = builder.separated(", ");
		for id in ids {
			separated.push_bind(id.clone());
		}
		separated.push_unseparated(")");

		let rows: Vec<(String,)> = builder.build_query_as().fetch_all(&self.pool).await?;

		Ok(rows.into_iter().map(|(id,)| id).collect())
	}

	#[instrument(skip(self, outages), fields(count = outages.len()))]
	async fn record_all(&self, outages: &[OutageRecord]) -> Result<()> {
		if outages.is_empty() {
			return Ok(());
		}

		let now = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
		let mut rows = Vec::with_capacity(outages.len());
		for outage in outages {
			rows.push((outage.id.clone(), outage.to_pretty_json()?));
		}

		// Single multi-row INSERT: SQLite applies it all or not at all.
		let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO outages (outage_id, data, created_at) ");
		builder.push_values(rows, |mut row, (outage_id, data)| {
			row.push_bind(outage_id).push_bind(data).push_bind(now.clone());
		});

		builder
			.build()
			.execute(&self.pool)
			.await
			.map_err(|e| match e {
				sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
					DbError::Conflict("Outage already recorded".to_string())
				}
				_ => DbError::Sqlx(e),
			})?;

		tracing::debug!("recorded outages");
		Ok(())
	}

	#[instrument(skip(self))]
	async fn count(&self) -> Result<i64> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM outages")
			.fetch_one(&self.pool)
			.await?;
		Ok(count)
	}

	#[instrument(skip(self))]
	async fn get_outage(&self, outage_id: &str) -> Result<Option<StoredOutage>> {
		let row = sqlx::query_as::<_, StoredOutage>(
			"SELECT outage_id, data, created_at FROM outages WHERE outage_id = ?",
		)
		.bind(outage_id)
		.fetch_optional(&self.pool)
		.await?;
		Ok(row)
	}

	#[instrument(skip(self))]
	async fn list_recent(&self, limit: u32) -> Result<Vec<StoredOutage>> {
		let rows = sqlx::query_as::<_, StoredOutage>(
			r#"
			SELECT outage_id, data, created_at
			FROM outages
			ORDER BY created_at DESC, outage_id
			LIMIT ?
			"#,
		)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;
		Ok(rows)
	}
}
