// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod check;

pub use check::{CheckJob, CheckState, CHECK_JOB_ID, CHECK_JOB_NAME};
