use clap::Parser;
use std::time::Duration;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	#[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379", help = "Redis connection URL")]
	pub redis_url: String,

	#[arg(
		long,
		env = "REDIS_STREAMS",
		default_value = "transcription:media:asr",
		value_delimiter = ',',
		help = "Comma-separated stream names to consume"
	)]
	pub streams: Vec<String>,

	#[arg(long, env = "REDIS_CONSUMER_GROUP", default_value = "transcription", help = "Consumer group name")]
	pub consumer_group: String,

	#[arg(long, env = "REDIS_CONSUMER", default_value = "transcription_worker", help = "Consumer name within the group")]
	pub consumer_name: String,

	#[arg(
		long,
		env = "DATABASE_URL",
		default_value = "sqlite://transcriber.db?mode=rwc",
		help = "Task store database URL"
	)]
	pub database_url: String,

	#[arg(long, env = "FILE_SERVICE_API", default_value = "http://localhost:8001", help = "File service base URL")]
	pub file_service_api: String,

	#[arg(long, env = "OPENAI_API_KEY", default_value = "", help = "API key for the transcription backend")]
	pub openai_api_key: String,

	#[arg(
		long,
		env = "OPENAI_API_BASE",
		default_value = "https://api.openai.com/v1",
		help = "Base URL of the transcription backend"
	)]
	pub openai_api_base: String,

	#[arg(long, env = "WHISPER_MODEL", default_value = "whisper-1", help = "Transcription model identifier")]
	pub whisper_model: String,

	#[arg(long, env = "TARGET_CHUNK_SIZE_MB", default_value = "20", help = "Target audio chunk size in MB")]
	pub target_chunk_size_mb: u64,

	#[arg(long, env = "OPENAI_API_LIMIT_MB", default_value = "25", help = "Hard backend payload limit in MB")]
	pub openai_api_limit_mb: u64,

	#[arg(
		long,
		env = "DOWNLOAD_TIMEOUT_SECS",
		default_value = "300",
		value_parser = parse_duration,
		help = "Source media download timeout in seconds"
	)]
	pub download_timeout: Duration,

	#[arg(
		long,
		env = "REQUEST_TIMEOUT_SECS",
		default_value = "300",
		value_parser = parse_duration,
		help = "Timeout for backend and file service requests in seconds"
	)]
	pub request_timeout: Duration,

	#[arg(
		long,
		env = "MAX_CONCURRENT_TRANSCRIPTIONS",
		default_value = "8",
		help = "Global cap on concurrent backend transcription calls"
	)]
	pub max_concurrent_transcriptions: usize,

	#[arg(
		long,
		env = "WATCHDOG_INTERVAL_SECS",
		default_value = "600",
		value_parser = parse_duration,
		help = "Stuck-task sweep interval in seconds"
	)]
	pub watchdog_interval: Duration,

	#[arg(
		long,
		env = "STUCK_TASK_TIMEOUT_SECS",
		default_value = "3600",
		value_parser = parse_duration,
		help = "Age after which a Running task counts as stuck, in seconds"
	)]
	pub stuck_task_timeout: Duration,

	#[arg(long, env = "SLACK_WEBHOOK_URL", default_value = "", help = "Webhook for stuck-task and failure notifications")]
	pub slack_webhook_url: String,
}

impl Config {
	/// # Errors
	/// Returns a message describing the first invalid field.
	pub fn validate(&self) -> Result<(), String> {
		if self.openai_api_key.is_empty() {
			return Err("OPENAI_API_KEY must be set".to_string());
		}
		if self.streams.is_empty() {
			return Err("REDIS_STREAMS must name at least one stream".to_string());
		}
		if self.target_chunk_size_mb == 0 || self.openai_api_limit_mb == 0 {
			return Err("chunk size and API limit must be non-zero".to_string());
		}
		if self.target_chunk_size_mb > self.openai_api_limit_mb {
			return Err("TARGET_CHUNK_SIZE_MB must not exceed OPENAI_API_LIMIT_MB".to_string());
		}
		if self.max_concurrent_transcriptions == 0 {
			return Err("MAX_CONCURRENT_TRANSCRIPTIONS must be at least 1".to_string());
		}
		Ok(())
	}

	#[must_use]
	pub const fn target_chunk_bytes(&self) -> u64 {
		self.target_chunk_size_mb * BYTES_PER_MB
	}

	#[must_use]
	pub const fn api_limit_bytes(&self) -> u64 {
		self.openai_api_limit_mb * BYTES_PER_MB
	}

	#[must_use]
	pub fn slack_webhook(&self) -> Option<String> {
		if self.slack_webhook_url.is_empty() {
			None
		} else {
			Some(self.slack_webhook_url.clone())
		}
	}
}

fn parse_duration(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}
