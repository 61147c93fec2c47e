// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

pub async fn create_test_pool() -> SqlitePool {
	SqlitePool::connect(":memory:").await.unwrap()
}

pub async fn create_outages_table(pool: &SqlitePool) {
	crate::pool::run_migrations(pool).await.unwrap();
}

pub async fn create_outage_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	create_outages_table(&pool).await;
	pool
}
