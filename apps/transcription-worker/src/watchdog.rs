use crate::notify::Notifier;
use serde_json::json;
use std::time::Duration;
use task_store::{StoreError, TaskStore};
use tracing::{error, info, warn};

/// Periodic sweep that fails tasks stuck in `Running` longer than the
/// configured window. Recovers rows orphaned by worker crashes, since an
/// acknowledged stream entry is never redelivered.
pub struct Watchdog {
	store: TaskStore,
	notifier: Notifier,
	interval: Duration,
	stale_after: Duration,
}

impl Watchdog {
	#[must_use]
	pub fn new(store: TaskStore, notifier: Notifier, interval: Duration, stale_after: Duration) -> Self {
		Self {
			store,
			notifier,
			interval,
			stale_after,
		}
	}

	/// Sweeps forever. Sweep failures are logged and the loop continues.
	pub async fn run(self) {
		info!(
			interval_secs = self.interval.as_secs(),
			stale_after_secs = self.stale_after.as_secs(),
			"Stuck-task watchdog started"
		);

		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		loop {
			ticker.tick().await;
			if let Err(e) = self.sweep().await {
				error!(error = %e, "Watchdog sweep failed");
			}
		}
	}

	/// One pass: mark every stale `Running` row as `Failed` and notify per
	/// task.
	///
	/// # Errors
	/// Returns an error when the stale scan itself fails; individual row
	/// updates are best-effort.
	pub async fn sweep(&self) -> Result<usize, StoreError> {
		let stale = self.store.list_stale_running(self.stale_after).await?;
		if stale.is_empty() {
			return Ok(0);
		}

		warn!(count = stale.len(), "Found stuck tasks");

		let summary = json!({
			"exception": format!(
				"Task is stuck in the Running state for more than {}s",
				self.stale_after.as_secs()
			)
		});

		let mut failed = 0;
		for record in stale {
			match self.store.mark_failed(&record.uuid, &summary).await {
				Ok(()) => {
					warn!(task_uuid = %record.uuid, started_at = ?record.started_at, "Marked stuck task as failed");
					self.notifier.stuck_task(&record.uuid, record.started_at).await;
					failed += 1;
				}
				Err(e) => {
					error!(task_uuid = %record.uuid, error = %e, "Failed to update stuck task");
				}
			}
		}

		Ok(failed)
	}
}
