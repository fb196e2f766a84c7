use crate::error::WorkerError;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Streams the source media from `url` to `dest`, sending the bearer token
/// when one is provided.
///
/// # Errors
/// Returns `WorkerError::Transfer` on any transport or HTTP failure.
pub async fn download_to(
	http: &reqwest::Client,
	url: &str,
	auth_token: Option<&str>,
	dest: &Path,
	timeout: Duration,
) -> Result<(), WorkerError> {
	debug!(url, dest = %dest.display(), "Downloading source media");

	let mut request = http.get(url).timeout(timeout);
	if let Some(token) = auth_token {
		request = request.bearer_auth(token);
	}

	let response = request
		.send()
		.await
		.map_err(|e| WorkerError::Transfer(format!("Request error downloading from {url}: {e}")))?;

	let status = response.status();
	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();
		return Err(WorkerError::Transfer(format!(
			"HTTP error {} downloading from {url}: {}",
			status.as_u16(),
			body.trim()
		)));
	}

	let mut file = tokio::fs::File::create(dest).await?;
	let mut stream = response.bytes_stream();
	while let Some(bytes) = stream.next().await {
		let bytes = bytes.map_err(|e| WorkerError::Transfer(format!("Request error downloading from {url}: {e}")))?;
		file.write_all(&bytes).await?;
	}
	file.flush().await?;

	info!(url, "Source media downloaded");
	Ok(())
}

/// Uploads the SRT artifact to the file service's GridFS endpoint and
/// returns the opaque artifact id.
///
/// # Errors
/// Returns `WorkerError::Transfer` on transport/HTTP failure or when the
/// service replies without an `id`.
pub async fn upload_srt(http: &reqwest::Client, file_service_api: &str, path: &Path, file_name: &str) -> Result<String, WorkerError> {
	let upload_url = format!("{}/gridfs", file_service_api.trim_end_matches('/'));
	debug!(url = %upload_url, file_name, "Uploading SRT artifact");

	let data = tokio::fs::read(path).await?;
	let part = Part::bytes(data)
		.file_name(file_name.to_string())
		.mime_str("text/plain")
		.map_err(|e| WorkerError::Transfer(format!("Failed to build upload part: {e}")))?;
	let form = Form::new().part("file", part);

	let response = http
		.put(&upload_url)
		.multipart(form)
		.send()
		.await
		.map_err(|e| WorkerError::Transfer(format!("Request error uploading to GridFS: {e}")))?;

	let status = response.status();
	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();
		return Err(WorkerError::Transfer(format!(
			"HTTP error uploading to GridFS: {} - {}",
			status.as_u16(),
			body.trim()
		)));
	}

	let reply: serde_json::Value = response
		.json()
		.await
		.map_err(|e| WorkerError::Transfer(format!("Invalid GridFS response: {e}")))?;

	reply
		.get("id")
		.and_then(serde_json::Value::as_str)
		.map(ToOwned::to_owned)
		.ok_or_else(|| WorkerError::Transfer("File ID not found in GridFS response after upload".to_string()))
}
