// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cron expression parsing and next fire calculation.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

use crate::error::{JobError, Result};

/// Convert a standard 5-field Unix cron expression to the 6-field format
/// (with a leading seconds field) accepted by the `cron` crate.
///
/// 6- and 7-field expressions are passed through unchanged.
fn normalize_expression(expression: &str) -> String {
	let field_count = expression.split_whitespace().count();
	if field_count == 5 {
		format!("0 {expression}")
	} else {
		expression.to_string()
	}
}

/// Parse a job schedule. Times are evaluated in UTC.
///
/// # Errors
///
/// Returns `JobError::InvalidSchedule` if the expression does not parse.
pub fn parse_schedule(expression: &str) -> Result<Schedule> {
	Schedule::from_str(&normalize_expression(expression.trim())).map_err(|e| {
		JobError::InvalidSchedule {
			expression: expression.to_string(),
			message: e.to_string(),
		}
	})
}

/// The first fire time strictly after `after`.
pub fn next_fire(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
	schedule.after(&after).next()
}
