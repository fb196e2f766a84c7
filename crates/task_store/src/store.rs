use crate::error::StoreError;
use crate::model::{TaskRecord, TaskStatus};
use crate::schema;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use tracing::warn;

const TABLE: &str = "transcriber_task_consumer_queue";

/// Durable record of each job's lifecycle status.
///
/// Constructed once at startup from a pool and injected into every component
/// that persists. Every write is a single-row update by primary key,
/// committed immediately.
#[derive(Clone)]
pub struct TaskStore {
	pool: SqlitePool,
}

impl TaskStore {
	#[must_use]
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// # Errors
	/// Returns an error when the DDL statement fails.
	pub async fn init_schema(&self) -> Result<(), StoreError> {
		schema::init_schema(&self.pool).await?;
		Ok(())
	}

	/// Marks a task as `Running` and stamps its start time.
	///
	/// # Errors
	/// Returns an error when the update fails.
	pub async fn mark_running(&self, uuid: &str) -> Result<(), StoreError> {
		let updated = sqlx::query(&format!("UPDATE {TABLE} SET task_status = ?1, started_at = ?2 WHERE obj_uuid = ?3"))
			.bind(TaskStatus::Running.as_str())
			.bind(Utc::now())
			.bind(uuid)
			.execute(&self.pool)
			.await?;

		if updated.rows_affected() == 0 {
			warn!(task_uuid = %uuid, "No pending task row to mark running");
		}
		Ok(())
	}

	/// Marks a task as `Success`, storing its result payload and finish time.
	///
	/// # Errors
	/// Returns an error when serialization or the update fails.
	pub async fn mark_success(&self, uuid: &str, result: &serde_json::Value) -> Result<(), StoreError> {
		self.finish(uuid, TaskStatus::Success, result).await
	}

	/// Marks a task as `Failed`, storing the failure summary and finish time.
	///
	/// # Errors
	/// Returns an error when serialization or the update fails.
	pub async fn mark_failed(&self, uuid: &str, result: &serde_json::Value) -> Result<(), StoreError> {
		self.finish(uuid, TaskStatus::Failed, result).await
	}

	/// Returns every `Running` record whose start time is older than `timeout`.
	///
	/// # Errors
	/// Returns an error when the query or row decoding fails.
	pub async fn list_stale_running(&self, timeout: Duration) -> Result<Vec<TaskRecord>, StoreError> {
		let cutoff = Utc::now() - chrono::Duration::seconds(timeout.as_secs().try_into().unwrap_or(i64::MAX));

		let rows = sqlx::query(&format!(
			"SELECT obj_uuid, event_name, task_status, task_data, task_result, started_at, finished_at \
             FROM {TABLE} \
             WHERE task_status = ?1 AND started_at IS NOT NULL AND datetime(started_at) < datetime(?2)"
		))
		.bind(TaskStatus::Running.as_str())
		.bind(cutoff)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(decode_record).collect()
	}

	/// Fetches one record by task uuid.
	///
	/// # Errors
	/// Returns an error when the query or row decoding fails.
	pub async fn get(&self, uuid: &str) -> Result<Option<TaskRecord>, StoreError> {
		let row = sqlx::query(&format!(
			"SELECT obj_uuid, event_name, task_status, task_data, task_result, started_at, finished_at \
             FROM {TABLE} WHERE obj_uuid = ?1"
		))
		.bind(uuid)
		.fetch_optional(&self.pool)
		.await?;

		row.map(decode_record).transpose()
	}

	async fn finish(&self, uuid: &str, status: TaskStatus, result: &serde_json::Value) -> Result<(), StoreError> {
		let updated = sqlx::query(&format!(
			"UPDATE {TABLE} SET task_status = ?1, task_result = ?2, finished_at = ?3 WHERE obj_uuid = ?4"
		))
		.bind(status.as_str())
		.bind(serde_json::to_string(result)?)
		.bind(Utc::now())
		.bind(uuid)
		.execute(&self.pool)
		.await?;

		if updated.rows_affected() == 0 {
			warn!(task_uuid = %uuid, status = status.as_str(), "No task row to finish");
		}
		Ok(())
	}
}

fn decode_record(row: SqliteRow) -> Result<TaskRecord, StoreError> {
	let status_raw: String = row.try_get("task_status")?;
	let payload_raw: String = row.try_get("task_data")?;
	let result_raw: String = row.try_get("task_result")?;
	let started_at: Option<DateTime<Utc>> = row.try_get("started_at")?;
	let finished_at: Option<DateTime<Utc>> = row.try_get("finished_at")?;

	Ok(TaskRecord {
		uuid: row.try_get("obj_uuid")?,
		stream: row.try_get("event_name")?,
		status: status_raw.parse()?,
		payload: decode_json(&payload_raw)?,
		result: decode_json(&result_raw)?,
		started_at,
		finished_at,
	})
}

fn decode_json(raw: &str) -> Result<serde_json::Value, StoreError> {
	if raw.trim().is_empty() {
		return Ok(serde_json::Value::Null);
	}
	Ok(serde_json::from_str(raw)?)
}
