// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job scheduler for the outage reporter.
//!
//! Jobs declare a cron schedule and a timeout. Every run races the job
//! against its timeout and a cancellation token; whichever finishes first
//! decides the outcome. Failed runs are not retried: the next scheduled fire
//! is the retry.

pub mod context;
pub mod error;
pub mod health;
pub mod job;
pub mod runner;
pub mod schedule;
pub mod scheduler;
pub mod types;

pub use context::{CancellationToken, JobContext};
pub use error::{JobError, Result};
pub use health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
pub use job::{Job, DEFAULT_TIMEOUT};
pub use runner::{execute, run_guarded};
pub use schedule::{next_fire, parse_schedule};
pub use scheduler::JobScheduler;
pub use types::{JobOutput, JobRun, JobStatus, TriggerSource};
