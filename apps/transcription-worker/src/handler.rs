use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::job::{ResultPayload, TranscriptionJob};
use crate::{ffmpeg, orchestrator, publish, transfer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Orchestrates one job end-to-end: acquire input, convert, transcribe,
/// upload, publish, persist. Owns the job's temporary workspace; the
/// state machine is linear and terminal (`Created → Running → {Succeeded,
/// Failed}`), with no retries within a job instance.
pub struct TaskHandler {
	stream: String,
	job: TranscriptionJob,
	ctx: Arc<WorkerContext>,
}

impl TaskHandler {
	#[must_use]
	pub fn new(stream: String, job: TranscriptionJob, ctx: Arc<WorkerContext>) -> Self {
		Self { stream, job, ctx }
	}

	/// Runs the job to a terminal state. Pipeline failures are captured into
	/// the result payload and never re-raised past this boundary; only task
	/// store failures propagate.
	///
	/// # Errors
	/// Returns an error when a task store write fails.
	pub async fn process(self) -> Result<(), WorkerError> {
		info!(task_uuid = %self.job.task_uuid, stream = %self.stream, file_name = %self.job.file_name, "Processing task");

		self.ctx.store.mark_running(&self.job.task_uuid).await?;

		let mut error_message = None;
		let mut file_id = None;

		match self.run_pipeline().await {
			Ok(id) => file_id = Some(id),
			Err(e) => {
				error!(task_uuid = %self.job.task_uuid, error = %e, "Task pipeline failed");
				self.ctx.notifier.task_failure(&self.job.task_uuid, &self.stream, &e.to_string()).await;
				error_message = Some(e.stage_message());
			}
		}

		let mut payload = build_result_payload(&self.job, file_id, error_message.clone());

		let mut publish_failed = false;
		if let Some(callback_uri) = self.job.callback_uri() {
			match publish::publish_result(&self.ctx.http, callback_uri, &payload).await {
				Ok(entry_id) => {
					info!(task_uuid = %self.job.task_uuid, callback_uri, entry_id, "Result published");
				}
				Err(e) => {
					// A completed transcription still ends Failed when its
					// delivery fails; the publish failure is the recorded error.
					error!(task_uuid = %self.job.task_uuid, callback_uri, error = %e, "Failed to publish result");
					self.ctx.notifier.task_failure(&self.job.task_uuid, &self.stream, &e.to_string()).await;
					payload.error = Some(e.stage_message());
					publish_failed = true;
				}
			}
		} else {
			warn!(task_uuid = %self.job.task_uuid, "No callback_uri provided; skipping result publishing");
		}

		let result = serde_json::to_value(&payload)?;
		if error_message.is_some() || publish_failed {
			self.ctx.store.mark_failed(&self.job.task_uuid, &result).await?;
		} else {
			self.ctx.store.mark_success(&self.job.task_uuid, &result).await?;
		}

		info!(task_uuid = %self.job.task_uuid, "Processing finished");
		Ok(())
	}

	/// Download, convert, transcribe, upload. Returns the artifact id.
	async fn run_pipeline(&self) -> Result<String, WorkerError> {
		// Scoped workspace, removed on every exit path.
		let workspace = tempfile::Builder::new()
			.prefix("transcriber_")
			.tempdir()
			.map_err(|e| WorkerError::Generic(format!("Failed to create temp dir: {e}")))?;

		let input_path: PathBuf = workspace.path().join(&self.job.file_name);
		transfer::download_to(
			&self.ctx.http,
			&self.job.download_url,
			Some(&self.job.token),
			&input_path,
			self.ctx.config.download_timeout,
		)
		.await?;

		let wav_path = workspace.path().join(format!("{}_converted.wav", self.job.file_stem()));
		ffmpeg::convert_to_wav(&input_path, &wav_path).await?;

		let srt_content = orchestrator::process_and_transcribe(&self.ctx, &wav_path).await?;
		if srt_content.is_empty() {
			// Empty output is acceptable for a sub-chunk, not for a whole job.
			return Err(WorkerError::Generic("Transcription resulted in empty SRT content.".to_string()));
		}

		let srt_name = format!("{}.srt", self.job.file_stem());
		let srt_path = workspace.path().join(&srt_name);
		tokio::fs::write(&srt_path, &srt_content).await?;

		let file_id = transfer::upload_srt(&self.ctx.http, &self.ctx.config.file_service_api, &srt_path, &srt_name).await?;
		info!(task_uuid = %self.job.task_uuid, file_id, "SRT artifact uploaded");

		Ok(file_id)
	}
}

fn build_result_payload(job: &TranscriptionJob, file_id: Option<String>, error: Option<String>) -> ResultPayload {
	let file_name = file_id.as_ref().map(|_| format!("{}.srt", job.file_stem()));

	ResultPayload {
		task_uuid: job.task_uuid.clone(),
		client_id: job.client_id().map(ToOwned::to_owned),
		file_id,
		file_name,
		source_file_name: job.file_name.clone(),
		tokens: job.tokens,
		error,
		symlink: job.symlink.clone(),
	}
}
