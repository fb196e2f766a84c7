use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::handler::TaskHandler;
use crate::job::{self, TranscriptionJob};
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{error, info, warn};

const READ_BLOCK_MS: usize = 5000;
const READ_COUNT: usize = 10;

/// Consumer-group reader over the configured Redis streams. Entries are
/// acknowledged as soon as they are read, before processing starts, so a
/// crash mid-job loses the entry rather than redelivering it.
pub struct StreamConsumer {
	ctx: Arc<WorkerContext>,
	connection: redis::aio::MultiplexedConnection,
}

impl StreamConsumer {
	/// Connects to Redis and makes sure the consumer group exists on every
	/// configured stream.
	///
	/// # Errors
	/// Returns an error when the connection or group creation fails.
	pub async fn connect(ctx: Arc<WorkerContext>) -> Result<Self, WorkerError> {
		let client = redis::Client::open(ctx.config.redis_url.as_str())?;
		let mut connection = client.get_multiplexed_async_connection().await?;

		ensure_groups(&mut connection, &ctx.config.streams, &ctx.config.consumer_group).await?;

		Ok(Self { ctx, connection })
	}

	/// Reads and dispatches entries until the Redis connection fails.
	///
	/// # Errors
	/// Returns the transport error that ended the read loop.
	pub async fn run(mut self) -> Result<(), WorkerError> {
		info!(
			streams = ?self.ctx.config.streams,
			group = %self.ctx.config.consumer_group,
			consumer = %self.ctx.config.consumer_name,
			"Listening for transcription tasks"
		);

		let keys = self.ctx.config.streams.clone();
		let ids = vec![">"; keys.len()];
		let options = StreamReadOptions::default()
			.group(&self.ctx.config.consumer_group, &self.ctx.config.consumer_name)
			.count(READ_COUNT)
			.block(READ_BLOCK_MS);

		loop {
			let reply: StreamReadReply = self.connection.xread_options(&keys, &ids, &options).await?;

			for stream_key in reply.keys {
				for entry in stream_key.ids {
					// Ack first: a poison entry must not wedge the group.
					let _: i64 = self.connection.xack(&stream_key.key, &self.ctx.config.consumer_group, &[&entry.id]).await?;

					match decode_entry(&entry) {
						Ok(job) => self.dispatch(&stream_key.key, job),
						Err(e) => {
							error!(stream = %stream_key.key, entry_id = %entry.id, error = %e, "Discarding undecodable entry");
						}
					}
				}
			}
		}
	}

	fn dispatch(&self, stream: &str, job: TranscriptionJob) {
		info!(stream, task_uuid = %job.task_uuid, "Dispatching task");
		let ctx = Arc::clone(&self.ctx);
		let stream = stream.to_string();
		let task_uuid = job.task_uuid.clone();
		let handler = TaskHandler::new(stream.clone(), job, Arc::clone(&self.ctx));
		tokio::spawn(async move {
			if let Err(e) = handler.process().await {
				error!(task_uuid = %task_uuid, error = %e, "Task handler aborted");
				ctx.notifier.task_failure(&task_uuid, &stream, &e.to_string()).await;
			}
		});
	}
}

async fn ensure_groups(connection: &mut redis::aio::MultiplexedConnection, streams: &[String], group: &str) -> Result<(), WorkerError> {
	for stream in streams {
		let created: Result<String, redis::RedisError> = connection.xgroup_create_mkstream(stream, group, "$").await;
		match created {
			Ok(_) => info!(stream, group, "Created consumer group"),
			Err(e) if e.code() == Some("BUSYGROUP") => {
				info!(stream, group, "Consumer group already exists");
			}
			Err(e) => return Err(e.into()),
		}
	}
	Ok(())
}

fn decode_entry(entry: &redis::streams::StreamId) -> Result<TranscriptionJob, WorkerError> {
	let value = entry
		.map
		.get("data")
		.ok_or_else(|| WorkerError::Generic(format!("Entry {} has no data field", entry.id)))?;
	let raw: String = redis::from_redis_value(value)?;
	job::decode_job(&raw)
}
