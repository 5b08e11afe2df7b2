//! Status polling for long-running backend tasks.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use log::{debug, info, warn};

use crate::api::{StatusResponse, TaskStatus};
use crate::error::ApiError;

pub const BUILD_FAILED_MESSAGE: &str = "Building process failed";
pub const NOT_FOUND_MESSAGE: &str = "Task not found after maximum retries";

#[derive(Clone, Debug, PartialEq)]
pub enum PollStep {
	Continue,
	Completed(StatusResponse),
	Failed(StatusResponse),
	/// The status endpoint kept failing for the whole retry budget.
	Exhausted(ApiError),
}

impl PollStep {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, PollStep::Continue)
	}

	/// Inline message for a terminal failure.
	pub fn failure_message(&self) -> Option<&'static str> {
		match self {
			PollStep::Failed(_) => Some(BUILD_FAILED_MESSAGE),
			PollStep::Exhausted(_) => Some(NOT_FOUND_MESSAGE),
			_ => None,
		}
	}
}

/// Counts consecutive failed polls against a fixed budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollTracker {
	max_retries: u32,
	failures: u32,
}

impl PollTracker {
	pub fn new(max_retries: u32) -> Self {
		Self {
			max_retries: max_retries.max(1),
			failures: 0,
		}
	}

	pub fn failures(&self) -> u32 {
		self.failures
	}

	pub fn max_retries(&self) -> u32 {
		self.max_retries
	}

	pub fn observe(&mut self, outcome: Result<StatusResponse, ApiError>) -> PollStep {
		let response = match outcome {
			Ok(response) => response,
			Err(err) => {
				self.failures += 1;
				if self.failures >= self.max_retries {
					warn!("poll: giving up after {} failures: {err}", self.failures);
					return PollStep::Exhausted(err);
				}
				debug!("poll: attempt {} failed: {err}", self.failures);
				return PollStep::Continue;
			}
		};
		match response.status {
			TaskStatus::Completed => {
				self.failures = 0;
				PollStep::Completed(response)
			}
			TaskStatus::Failed => PollStep::Failed(response),
			TaskStatus::Pending | TaskStatus::Processing => {
				self.failures = 0;
				PollStep::Continue
			}
			TaskStatus::Unknown(ref raw) => {
				debug!("poll: unrecognised status {raw:?}");
				PollStep::Continue
			}
		}
	}
}

/// Shared stop flag for a polling loop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.set(true);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.get()
	}
}

/// Cancels its loop when dropped, e.g. when replaced or when the view goes away.
#[derive(Debug)]
pub struct PollGuard(CancelToken);

impl PollGuard {
	pub fn arm() -> (Self, CancelToken) {
		let token = CancelToken::new();
		(Self(token.clone()), token)
	}
}

impl Drop for PollGuard {
	fn drop(&mut self) {
		self.0.cancel();
	}
}

/// Poll now, then every `interval_ms`, until a terminal step.
///
/// Returns `None` when cancelled. `on_retry` sees the failure count after
/// every non-terminal step.
pub async fn poll_until_settled<F, Fut>(
	mut fetch: F,
	mut tracker: PollTracker,
	interval_ms: u32,
	cancel: CancelToken,
	mut on_retry: impl FnMut(u32),
) -> Option<PollStep>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<StatusResponse, ApiError>>,
{
	loop {
		if cancel.is_cancelled() {
			return None;
		}
		let outcome = fetch().await;
		if cancel.is_cancelled() {
			info!("poll: cancelled");
			return None;
		}
		let step = tracker.observe(outcome);
		if step.is_terminal() {
			return Some(step);
		}
		on_retry(tracker.failures());
		TimeoutFuture::new(interval_ms).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn status(status: TaskStatus) -> Result<StatusResponse, ApiError> {
		Ok(StatusResponse {
			task_id: "t1".into(),
			status,
			..StatusResponse::default()
		})
	}

	fn not_found() -> Result<StatusResponse, ApiError> {
		Err(ApiError::Status {
			status: 404,
			path: "/api/clustering_status/missing".into(),
		})
	}

	#[test]
	fn pending_then_completed_stops() {
		let mut tracker = PollTracker::new(10);
		assert_eq!(tracker.observe(status(TaskStatus::Pending)), PollStep::Continue);
		let step = tracker.observe(status(TaskStatus::Completed));
		assert!(matches!(step, PollStep::Completed(ref r) if r.task_id == "t1"));
		assert!(step.is_terminal());
		assert_eq!(step.failure_message(), None);
	}

	#[test]
	fn ten_consecutive_failures_exhaust() {
		let mut tracker = PollTracker::new(10);
		for attempt in 1..10 {
			assert_eq!(tracker.observe(not_found()), PollStep::Continue);
			assert_eq!(tracker.failures(), attempt);
		}
		let step = tracker.observe(not_found());
		assert!(matches!(step, PollStep::Exhausted(_)));
		assert_eq!(step.failure_message(), Some(NOT_FOUND_MESSAGE));
	}

	#[test]
	fn success_resets_failure_count() {
		let mut tracker = PollTracker::new(3);
		tracker.observe(not_found());
		tracker.observe(not_found());
		assert_eq!(tracker.observe(status(TaskStatus::Processing)), PollStep::Continue);
		assert_eq!(tracker.failures(), 0);
		tracker.observe(not_found());
		assert_eq!(tracker.observe(not_found()), PollStep::Continue);
	}

	#[test]
	fn backend_failure_is_distinct_from_exhaustion() {
		let mut tracker = PollTracker::new(10);
		let step = tracker.observe(status(TaskStatus::Failed));
		assert_eq!(step.failure_message(), Some(BUILD_FAILED_MESSAGE));
	}

	#[test]
	fn cancel_is_shared() {
		let token = CancelToken::new();
		let clone = token.clone();
		clone.cancel();
		assert!(token.is_cancelled());
	}

	#[test]
	fn dropping_guard_cancels() {
		let (guard, token) = PollGuard::arm();
		assert!(!token.is_cancelled());
		drop(guard);
		assert!(token.is_cancelled());
	}
}
