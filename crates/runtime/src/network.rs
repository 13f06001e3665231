//! In-flight request accounting behind the network-idle wait.
//!
//! Engines feed request lifecycle events into a [`NetworkTracker`]; the page
//! counts as idle once nothing has been in flight for the idle window.

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::engine::IdleOptions;
use crate::error::{Error, Result};

/// What an idle wait observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleReport {
	pub waited: Duration,
	/// Requests that started while waiting.
	pub requests_seen: u64,
}

#[derive(Debug)]
struct Activity {
	in_flight: HashSet<String>,
	last_change: Instant,
	started: u64,
}

/// Tracks which requests of one page are still outstanding.
#[derive(Debug)]
pub struct NetworkTracker {
	activity: Mutex<Activity>,
	generation: watch::Sender<u64>,
}

impl Default for NetworkTracker {
	fn default() -> Self {
		Self::new()
	}
}

impl NetworkTracker {
	pub fn new() -> Self {
		let (generation, _) = watch::channel(0);
		Self {
			activity: Mutex::new(Activity {
				in_flight: HashSet::new(),
				last_change: Instant::now(),
				started: 0,
			}),
			generation,
		}
	}

	/// Records a request leaving the page. Redirect hops reuse their id.
	pub fn request_started(&self, id: impl Into<String>) {
		let mut activity = self.activity.lock();
		if activity.in_flight.insert(id.into()) {
			activity.started += 1;
		}
		activity.last_change = Instant::now();
		drop(activity);
		self.bump();
	}

	/// Records a request that finished or failed. Unknown ids are ignored.
	pub fn request_finished(&self, id: &str) {
		let mut activity = self.activity.lock();
		if activity.in_flight.remove(id) {
			activity.last_change = Instant::now();
			drop(activity);
			self.bump();
		}
	}

	/// Forgets every outstanding request, e.g. before a top-level navigation.
	pub fn reset(&self) {
		let mut activity = self.activity.lock();
		activity.in_flight.clear();
		activity.last_change = Instant::now();
		drop(activity);
		self.bump();
	}

	pub fn in_flight(&self) -> usize {
		self.activity.lock().in_flight.len()
	}

	/// Resolves once no request has been in flight for `options.idle`,
	/// counted from the later of the call and the last request change.
	///
	/// Fails with [`Error::Timeout`] when `options.timeout` passes first.
	pub async fn wait_for_quiet(&self, options: IdleOptions) -> Result<IdleReport> {
		let start = Instant::now();
		let deadline = start + options.timeout;
		let started_before = self.activity.lock().started;
		let mut changes = self.generation.subscribe();

		loop {
			changes.borrow_and_update();
			let (in_flight, last_change, started) = {
				let activity = self.activity.lock();
				(activity.in_flight.len(), activity.last_change, activity.started)
			};

			let now = Instant::now();
			let wake_at = if in_flight == 0 {
				let ready_at = last_change.max(start) + options.idle;
				if now >= ready_at {
					return Ok(IdleReport {
						waited: now - start,
						requests_seen: started - started_before,
					});
				}
				ready_at.min(deadline)
			} else {
				deadline
			};

			if now >= deadline {
				return Err(Error::Timeout {
					ms: options.timeout.as_millis() as u64,
					condition: format!("network idle ({in_flight} requests in flight)"),
				});
			}

			tokio::select! {
				_ = changes.changed() => {}
				_ = tokio::time::sleep_until(wake_at) => {}
			}
		}
	}

	fn bump(&self) {
		self.generation.send_modify(|generation| *generation = generation.wrapping_add(1));
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	fn options(idle_ms: u64, timeout_ms: u64) -> IdleOptions {
		IdleOptions {
			idle: Duration::from_millis(idle_ms),
			timeout: Duration::from_millis(timeout_ms),
		}
	}

	#[tokio::test]
	async fn quiet_page_waits_one_idle_window() {
		let tracker = NetworkTracker::new();
		let report = tracker.wait_for_quiet(options(30, 1000)).await.unwrap();
		assert!(report.waited >= Duration::from_millis(30));
		assert_eq!(report.requests_seen, 0);
	}

	#[tokio::test]
	async fn outstanding_request_holds_the_wait_open() {
		let tracker = Arc::new(NetworkTracker::new());
		tracker.request_started("xhr-1");

		let finisher = Arc::clone(&tracker);
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(150)).await;
			finisher.request_finished("xhr-1");
		});

		let report = tracker.wait_for_quiet(options(20, 2000)).await.unwrap();
		assert!(report.waited >= Duration::from_millis(170), "returned after {:?}", report.waited);
		assert_eq!(tracker.in_flight(), 0);
	}

	#[tokio::test]
	async fn request_started_during_window_restarts_it() {
		let tracker = Arc::new(NetworkTracker::new());
		let late = Arc::clone(&tracker);
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			late.request_started("late");
			tokio::time::sleep(Duration::from_millis(100)).await;
			late.request_finished("late");
		});

		let report = tracker.wait_for_quiet(options(50, 2000)).await.unwrap();
		assert!(report.waited >= Duration::from_millis(170), "returned after {:?}", report.waited);
		assert_eq!(report.requests_seen, 1);
	}

	#[tokio::test]
	async fn stuck_request_times_out() {
		let tracker = NetworkTracker::new();
		tracker.request_started("long-poll");

		let err = tracker.wait_for_quiet(options(10, 80)).await.unwrap_err();
		assert!(matches!(err, Error::Timeout { ms: 80, .. }), "{err}");
	}

	#[tokio::test]
	async fn reset_drops_outstanding_requests() {
		let tracker = NetworkTracker::new();
		tracker.request_started("old");
		tracker.request_finished("unknown");
		assert_eq!(tracker.in_flight(), 1);

		tracker.reset();
		assert_eq!(tracker.in_flight(), 0);
		assert!(tracker.wait_for_quiet(options(10, 500)).await.is_ok());
	}
}
