use thiserror::Error;

/// Error taxonomy for the worker pipeline.
///
/// Chunk-level backend errors never surface here: during batch transcription
/// they are swallowed into sentinel markers so the batch always completes.
/// Everything else propagates typed up to the task handler, which flattens
/// it to a single stored string and never re-raises past its boundary.
#[derive(Debug, Error)]
pub enum WorkerError {
	#[error("Audio chunking failed: {0}")]
	Chunking(String),

	#[error("Transcription backend error: {message}")]
	Backend { message: String, status: Option<u16> },

	#[error("FFmpeg conversion failed: {stderr}")]
	Conversion { stderr: String },

	#[error("Transfer error: {0}")]
	Transfer(String),

	#[error("Result publish failed: {0}")]
	Publish(String),

	#[error("Task store error: {0}")]
	Store(#[from] task_store::StoreError),

	#[error("Redis error: {0}")]
	Redis(#[from] redis::RedisError),

	#[error("Invalid job payload: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("{0}")]
	Generic(String),
}

impl From<std::io::Error> for WorkerError {
	fn from(error: std::io::Error) -> Self {
		Self::Generic(format!("I/O error: {error}"))
	}
}

impl WorkerError {
	/// Human-readable error string identifying the failed stage, stored on
	/// the task record and sent in the outbound result payload.
	#[must_use]
	pub fn stage_message(&self) -> String {
		match self {
			Self::Conversion { stderr } => format!("FFmpeg conversion failed: {stderr}"),
			Self::Backend { .. } | Self::Chunking(_) => format!("Transcription service error: {self}"),
			other => other.to_string(),
		}
	}
}
