use crate::chunker::{self, AudioChunk};
use crate::context::WorkerContext;
use crate::error::WorkerError;
use futures::future::join_all;
use std::path::Path;
use tracing::{error, info, warn};

/// Transcribes a converted WAV file, chunking when it exceeds the backend
/// payload limit, and returns the final SRT text.
///
/// A source below the hard limit is sent in one direct backend call; its
/// errors propagate. A larger source is split into clips, each transcribed
/// concurrently; a clip that is skipped as oversized or whose call fails
/// yields a sentinel failure marker instead of an error, so the batch always
/// completes with one result per planned chunk, in original order. The
/// stitcher then merges the ordered results. An empty merged document is a
/// valid outcome here; the task handler decides whether to accept it.
///
/// # Errors
/// Returns chunking errors, direct-call backend errors, and I/O failures
/// around the source file.
pub async fn process_and_transcribe(ctx: &WorkerContext, wav_path: &Path) -> Result<String, WorkerError> {
	let file_size = tokio::fs::metadata(wav_path).await?.len();
	let limit = ctx.config.api_limit_bytes();

	if file_size < limit {
		info!(file_size, limit, "File within backend limit; single direct call");
		let data = tokio::fs::read(wav_path).await?;
		let file_name = wav_path.file_name().and_then(|n| n.to_str()).unwrap_or("audio.wav").to_string();
		return ctx.backend.transcribe_wav(&file_name, data).await;
	}

	info!(file_size, limit, "File exceeds backend limit; chunked transcription");
	let plan = {
		let path = wav_path.to_path_buf();
		let target = ctx.config.target_chunk_bytes();
		tokio::task::spawn_blocking(move || chunker::split_wav(&path, file_size, target))
			.await
			.map_err(|e| WorkerError::Generic(format!("Chunking task failed: {e}")))??
	};

	let chunk_count = plan.chunks.len();
	let pieces = join_all(plan.chunks.into_iter().map(|chunk| transcribe_chunk(ctx, chunk, limit))).await;
	info!(
		chunk_count,
		transcribed = pieces.iter().filter(|p| p.is_some()).count(),
		"All chunk transcriptions finished"
	);

	Ok(subtitle::stitch(&pieces, plan.chunk_duration))
}

async fn transcribe_chunk(ctx: &WorkerContext, chunk: AudioChunk, limit: u64) -> Option<String> {
	if chunk.data.len() as u64 >= limit {
		warn!(index = chunk.index, bytes = chunk.data.len(), limit, "Chunk exceeds backend limit, skipping");
		return None;
	}

	let _permit = ctx.transcribe_permits.acquire().await.ok()?;

	match ctx.backend.transcribe_wav(&format!("chunk_{}.wav", chunk.index), chunk.data).await {
		Ok(srt) => Some(srt),
		Err(e) => {
			error!(index = chunk.index, error = %e, "Chunk transcription failed");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::{test_config, worker_context, TestServer};
	use std::time::Duration;

	const SRT_BODY: &str = "1\n00:00:00,000 --> 00:00:01,000\nhi\n\n";

	fn write_wav(dir: &tempfile::TempDir, seconds: u64) -> std::path::PathBuf {
		let path = dir.path().join("source.wav");
		let spec = hound::WavSpec {
			channels: 1,
			sample_rate: 16_000,
			bits_per_sample: 16,
			sample_format: hound::SampleFormat::Int,
		};
		let mut writer = hound::WavWriter::create(&path, spec).unwrap();
		for i in 0..(seconds * u64::from(spec.sample_rate)) {
			#[allow(clippy::cast_possible_truncation)]
			writer.write_sample((i % 128) as i16).unwrap();
		}
		writer.finalize().unwrap();
		path
	}

	#[tokio::test]
	async fn test_file_below_limit_uses_one_direct_call() {
		let backend = TestServer::start(200, SRT_BODY).await;
		let config = test_config(&["--openai-api-base", &backend.url(), "--openai-api-limit-mb", "2", "--target-chunk-size-mb", "1"]);
		let (ctx, _pool) = worker_context(config).await;

		let dir = tempfile::tempdir().unwrap();
		let path = write_wav(&dir, 1);

		let srt = process_and_transcribe(&ctx, &path).await.unwrap();
		assert_eq!(srt, SRT_BODY);
		assert_eq!(backend.hits(), 1);
	}

	#[tokio::test]
	async fn test_file_at_limit_fans_out_one_call_per_chunk() {
		let backend = TestServer::start(200, SRT_BODY).await;
		let config = test_config(&["--openai-api-base", &backend.url(), "--openai-api-limit-mb", "2", "--target-chunk-size-mb", "1"]);
		let (ctx, _pool) = worker_context(config).await;

		let dir = tempfile::tempdir().unwrap();
		// 66s of 16 kHz mono s16 is just over the 2 MB limit; against the
		// 1 MB target that plans three chunks.
		let path = write_wav(&dir, 66);

		let merged = process_and_transcribe(&ctx, &path).await.unwrap();
		assert_eq!(backend.hits(), 3);

		// Each chunk reports one 0-1s cue; stitching offsets them in order.
		let cues = subtitle::parse(&merged).unwrap();
		assert_eq!(cues.len(), 3);
		assert_eq!(cues[0].start, Duration::ZERO);
		assert_eq!(cues[1].start, Duration::from_secs(1));
		assert_eq!(cues[2].start, Duration::from_secs(2));
	}

	#[tokio::test]
	async fn test_oversized_chunk_is_skipped_without_a_call() {
		let backend = TestServer::start(200, SRT_BODY).await;
		// Chunk target above the hard limit: the single planned chunk is the
		// whole file and must be skipped, not submitted.
		let config = test_config(&["--openai-api-base", &backend.url(), "--openai-api-limit-mb", "1", "--target-chunk-size-mb", "2"]);
		let (ctx, _pool) = worker_context(config).await;

		let dir = tempfile::tempdir().unwrap();
		let path = write_wav(&dir, 34);

		let merged = process_and_transcribe(&ctx, &path).await.unwrap();
		assert_eq!(merged, "");
		assert_eq!(backend.hits(), 0);
	}

	#[tokio::test]
	async fn test_failed_chunks_yield_empty_document() {
		let backend = TestServer::start(500, "overloaded").await;
		let config = test_config(&["--openai-api-base", &backend.url(), "--openai-api-limit-mb", "2", "--target-chunk-size-mb", "1"]);
		let (ctx, _pool) = worker_context(config).await;

		let dir = tempfile::tempdir().unwrap();
		let path = write_wav(&dir, 66);

		let merged = process_and_transcribe(&ctx, &path).await.unwrap();
		assert_eq!(merged, "");
		assert_eq!(backend.hits(), 3);
	}
}
