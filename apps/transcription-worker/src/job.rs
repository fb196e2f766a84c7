use crate::error::WorkerError;
use serde::{Deserialize, Serialize};

/// Inbound transcription job, decoded from a stream entry's `data` field.
/// Immutable once received.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionJob {
	pub task_uuid: String,
	pub file_name: String,
	pub token: String,
	pub tokens: i64,
	pub download_url: String,
	#[serde(default)]
	pub service: String,
	#[serde(default)]
	pub language: String,
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub embed_subtitles: bool,
	#[serde(default)]
	pub test_mode: Option<bool>,
	#[serde(default)]
	pub on_completed: Option<OnCompleted>,
	#[serde(default)]
	pub error: Option<String>,
	#[serde(default)]
	pub symlink: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnCompleted {
	pub callback_uri: String,
	#[serde(default)]
	pub data: Option<CallbackData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackData {
	pub client_id: String,
}

impl TranscriptionJob {
	#[must_use]
	pub fn callback_uri(&self) -> Option<&str> {
		self.on_completed.as_ref().map(|oc| oc.callback_uri.as_str())
	}

	#[must_use]
	pub fn client_id(&self) -> Option<&str> {
		self
			.on_completed
			.as_ref()
			.and_then(|oc| oc.data.as_ref())
			.map(|data| data.client_id.as_str())
	}

	/// File name stem used for the converted WAV and the output SRT.
	#[must_use]
	pub fn file_stem(&self) -> &str {
		let name = std::path::Path::new(&self.file_name);
		name.file_stem().and_then(|stem| stem.to_str()).unwrap_or("downloaded_file")
	}
}

/// Decodes a job payload, normalizing the legacy `task_id` field name to
/// `task_uuid` when the canonical field is absent.
///
/// # Errors
/// Returns an error when the payload is not valid JSON or is missing
/// required fields.
pub fn decode_job(raw: &str) -> Result<TranscriptionJob, WorkerError> {
	let mut value: serde_json::Value = serde_json::from_str(raw)?;
	normalize_task_uuid(&mut value);
	Ok(serde_json::from_value(value)?)
}

fn normalize_task_uuid(value: &mut serde_json::Value) {
	if let Some(fields) = value.as_object_mut() {
		if !fields.contains_key("task_uuid") {
			if let Some(id) = fields.remove("task_id") {
				fields.insert("task_uuid".to_string(), id);
			}
		}
	}
}

/// Outbound result message published to the job's callback destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultPayload {
	pub task_uuid: String,
	pub client_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file_name: Option<String>,
	pub source_file_name: String,
	pub tokens: i64,
	pub error: Option<String>,
	pub symlink: Option<String>,
}
