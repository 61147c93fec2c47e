// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod check;
mod database;
mod logging;

pub use check::{CheckConfig, CheckConfigLayer, DEFAULT_SCHEDULE, DEFAULT_TIMEOUT_SECS};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
