use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a transcription task row.
///
/// Rows are created as `Pending` by the upstream producer. The task handler
/// moves a row to `Running` and then to `Success` or `Failed`; the watchdog
/// moves stale `Running` rows to `Failed`. No other writer touches status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
	Pending,
	Running,
	Success,
	Failed,
}

impl TaskStatus {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "Pending",
			Self::Running => "Running",
			Self::Success => "Success",
			Self::Failed => "Failed",
		}
	}
}

impl FromStr for TaskStatus {
	type Err = StoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Pending" => Ok(Self::Pending),
			"Running" => Ok(Self::Running),
			"Success" => Ok(Self::Success),
			"Failed" => Ok(Self::Failed),
			other => Err(StoreError::UnknownStatus(other.to_string())),
		}
	}
}

/// Persisted record of one transcription task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
	pub uuid: String,
	pub stream: String,
	pub status: TaskStatus,
	pub payload: serde_json::Value,
	pub result: serde_json::Value,
	pub started_at: Option<DateTime<Utc>>,
	pub finished_at: Option<DateTime<Utc>>,
}
