use crate::error::WorkerError;
use crate::job::ResultPayload;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PublishReply {
	entry_id: String,
}

/// Publishes the result payload to the job's callback destination and
/// returns the stream entry id assigned by the receiver.
///
/// # Errors
/// Returns `WorkerError::Publish` on transport/HTTP failure or an
/// unreadable reply.
pub async fn publish_result(http: &reqwest::Client, callback_uri: &str, payload: &ResultPayload) -> Result<String, WorkerError> {
	debug!(callback_uri, task_uuid = %payload.task_uuid, "Publishing result");

	let response = http
		.post(callback_uri)
		.json(&json!({
			"data": payload,
			"source": "transcription_worker",
		}))
		.send()
		.await
		.map_err(|e| WorkerError::Publish(format!("Request error publishing to {callback_uri}: {e}")))?;

	let status = response.status();
	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();
		return Err(WorkerError::Publish(format!(
			"HTTP error {} publishing to {callback_uri}: {}",
			status.as_u16(),
			body.trim()
		)));
	}

	let reply: PublishReply = response
		.json()
		.await
		.map_err(|e| WorkerError::Publish(format!("Invalid publish response from {callback_uri}: {e}")))?;

	Ok(reply.entry_id)
}
