use crate::error::WorkerError;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Client for the OpenAI-compatible speech-to-text backend. Submits audio
/// bytes and a model identifier, requesting SRT-formatted output.
#[derive(Clone)]
pub struct BackendClient {
	http: reqwest::Client,
	base_url: String,
	api_key: String,
	model: String,
}

impl BackendClient {
	#[must_use]
	pub fn new(http: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
		Self {
			http,
			base_url: base_url.trim_end_matches('/').to_string(),
			api_key,
			model,
		}
	}

	/// Transcribes one self-contained WAV payload and returns the SRT text.
	///
	/// # Errors
	/// Returns `WorkerError::Backend` carrying the HTTP status code when the
	/// backend answered with an error, or without one on transport failure.
	pub async fn transcribe_wav(&self, file_name: &str, data: Vec<u8>) -> Result<String, WorkerError> {
		debug!(file_name, bytes = data.len(), model = %self.model, "Submitting audio to backend");

		let part = Part::bytes(data)
			.file_name(file_name.to_string())
			.mime_str("audio/wav")
			.map_err(|e| WorkerError::Generic(format!("Failed to build upload part: {e}")))?;
		let form = Form::new()
			.part("file", part)
			.text("model", self.model.clone())
			.text("response_format", "srt");

		let response = self
			.http
			.post(format!("{}/audio/transcriptions", self.base_url))
			.bearer_auth(&self.api_key)
			.multipart(form)
			.send()
			.await
			.map_err(|e| WorkerError::Backend {
				status: e.status().map(|s| s.as_u16()),
				message: e.to_string(),
			})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(WorkerError::Backend {
				status: Some(status.as_u16()),
				message: format!("status {}: {}", status.as_u16(), body.trim()),
			});
		}

		response.text().await.map_err(|e| WorkerError::Backend {
			status: None,
			message: format!("failed to read response body: {e}"),
		})
	}
}
