use sqlx::SqlitePool;

/// Bootstraps the task queue table for tests and local runs. In deployed
/// environments the table is owned by the upstream producer.
///
/// # Errors
/// Returns an error when the DDL statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
	sqlx::query(
		r"
        CREATE TABLE IF NOT EXISTS transcriber_task_consumer_queue (
            obj_uuid TEXT PRIMARY KEY,
            entry_id TEXT NOT NULL DEFAULT '',
            event_name TEXT NOT NULL DEFAULT '',
            task_status TEXT NOT NULL DEFAULT 'Pending',
            task_data TEXT NOT NULL DEFAULT '{}',
            task_result TEXT NOT NULL DEFAULT '{}',
            started_at TEXT,
            finished_at TEXT
        )
        ",
	)
	.execute(pool)
	.await?;

	Ok(())
}
