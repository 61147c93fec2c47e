// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::JobError;
use crate::types::TriggerSource;

pub struct JobContext {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	pub cancellation_token: CancellationToken,
}

impl JobContext {
	pub fn new(triggered_by: TriggerSource, cancellation_token: CancellationToken) -> Self {
		Self {
			run_id: uuid::Uuid::new_v4().to_string(),
			triggered_by,
			cancellation_token,
		}
	}

	/// Returns `JobError::Cancelled` once the run has been cancelled.
	pub fn ensure_active(&self) -> Result<(), JobError> {
		if self.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}
		Ok(())
	}
}

/// Cooperative cancellation signal shared between a run and its owner.
///
/// Cancelling a token cancels every token derived from it with
/// [`CancellationToken::child_token`], never the reverse.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
	inner: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.inner.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.is_cancelled()
	}

	/// Completes once the token is cancelled.
	pub async fn cancelled(&self) {
		self.inner.cancelled().await;
	}

	pub fn child_token(&self) -> Self {
		Self {
			inner: self.inner.child_token(),
		}
	}
}
