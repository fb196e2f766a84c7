use crate::error::WorkerError;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// One time-bounded sub-clip of the source audio: a self-contained WAV
/// payload plus its planned duration. Never persisted.
#[derive(Debug, Clone)]
pub struct AudioChunk {
	pub index: usize,
	pub data: Vec<u8>,
	pub duration: Duration,
}

/// Ordered, boundary-contiguous chunks covering the whole source, plus the
/// uniform planned chunk duration the stitcher re-times against.
#[derive(Debug)]
pub struct ChunkPlan {
	pub chunks: Vec<AudioChunk>,
	pub chunk_duration: Duration,
}

/// Splits a PCM WAV file into ordered, non-overlapping clips sized to fit
/// the backend payload limit. Clip boundaries land on frame boundaries so
/// every clip is independently decodable audio with its own RIFF header.
///
/// The chunk duration is derived from the file's byte rate and floored at
/// one second to avoid degenerate tiny chunks.
///
/// # Errors
/// Returns `WorkerError::Chunking` when the source has zero duration, the
/// computed chunk count is zero, or no usable clips result.
pub fn split_wav(path: &Path, file_size: u64, target_chunk_bytes: u64) -> Result<ChunkPlan, WorkerError> {
	let reader = hound::WavReader::open(path).map_err(|e| WorkerError::Chunking(format!("Failed to read WAV: {e}")))?;
	let spec = reader.spec();
	let channels = u64::from(spec.channels);
	let sample_rate = u64::from(spec.sample_rate);

	let samples: Vec<i16> = reader
		.into_samples::<i16>()
		.collect::<Result<_, _>>()
		.map_err(|e| WorkerError::Chunking(format!("Failed to decode WAV samples: {e}")))?;

	let frames = samples.len() as u64 / channels;
	let total_ms = frames * 1000 / sample_rate;
	if total_ms == 0 {
		return Err(WorkerError::Chunking("Audio file has zero duration".to_string()));
	}

	#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let chunk_ms = {
		let bytes_per_second = file_size as f64 / (total_ms as f64 / 1000.0);
		// At least one second per chunk.
		((target_chunk_bytes as f64 / bytes_per_second) * 1000.0).max(1000.0) as u64
	};

	let chunk_count = total_ms.div_ceil(chunk_ms);
	if chunk_count == 0 {
		return Err(WorkerError::Chunking("Calculated zero chunks for the audio".to_string()));
	}
	debug!(chunk_count, chunk_ms, total_ms, "Planned audio chunks");

	let frames_per_chunk = chunk_ms * sample_rate / 1000;
	let mut chunks = Vec::with_capacity(usize::try_from(chunk_count).unwrap_or_default());

	for index in 0..chunk_count {
		let start_frame = index * frames_per_chunk;
		let end_frame = (start_frame + frames_per_chunk).min(frames);
		if start_frame >= end_frame {
			warn!(index, "Skipping empty chunk");
			continue;
		}

		let start_sample = usize::try_from(start_frame * channels).map_err(|e| WorkerError::Chunking(e.to_string()))?;
		let end_sample = usize::try_from(end_frame * channels).map_err(|e| WorkerError::Chunking(e.to_string()))?;

		let data = encode_wav(spec, &samples[start_sample..end_sample])?;
		let duration = Duration::from_millis((end_frame - start_frame) * 1000 / sample_rate);

		chunks.push(AudioChunk {
			index: usize::try_from(index).map_err(|e| WorkerError::Chunking(e.to_string()))?,
			data,
			duration,
		});

		if end_frame >= frames {
			break;
		}
	}

	if chunks.is_empty() {
		return Err(WorkerError::Chunking("No valid audio chunk data could be generated".to_string()));
	}

	Ok(ChunkPlan {
		chunks,
		chunk_duration: Duration::from_millis(chunk_ms),
	})
}

fn encode_wav(spec: hound::WavSpec, samples: &[i16]) -> Result<Vec<u8>, WorkerError> {
	let mut cursor = Cursor::new(Vec::new());
	{
		let mut writer =
			hound::WavWriter::new(&mut cursor, spec).map_err(|e| WorkerError::Chunking(format!("Failed to encode chunk: {e}")))?;
		for &sample in samples {
			writer
				.write_sample(sample)
				.map_err(|e| WorkerError::Chunking(format!("Failed to encode chunk: {e}")))?;
		}
		writer
			.finalize()
			.map_err(|e| WorkerError::Chunking(format!("Failed to encode chunk: {e}")))?;
	}
	Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn mono_spec() -> hound::WavSpec {
		hound::WavSpec {
			channels: 1,
			sample_rate: 16_000,
			bits_per_sample: 16,
			sample_format: hound::SampleFormat::Int,
		}
	}

	fn write_wav(dir: &tempfile::TempDir, seconds: u64) -> (std::path::PathBuf, u64) {
		let path = dir.path().join("source.wav");
		let spec = mono_spec();
		let mut writer = hound::WavWriter::create(&path, spec).unwrap();
		for i in 0..(seconds * u64::from(spec.sample_rate)) {
			#[allow(clippy::cast_possible_truncation)]
			writer.write_sample((i % 128) as i16).unwrap();
		}
		writer.finalize().unwrap();
		let size = std::fs::metadata(&path).unwrap().len();
		(path, size)
	}

	#[test]
	fn test_chunks_cover_source_without_overlap() {
		let dir = tempfile::tempdir().unwrap();
		let (path, size) = write_wav(&dir, 3);

		// Target one third of the file per chunk: three one-second clips.
		let plan = split_wav(&path, size, size / 3).unwrap();
		assert_eq!(plan.chunks.len(), 3);
		assert_eq!(plan.chunk_duration, Duration::from_secs(1));

		let mut total_frames = 0_u32;
		for (i, chunk) in plan.chunks.iter().enumerate() {
			assert_eq!(chunk.index, i);
			assert_eq!(&chunk.data[..4], b"RIFF");

			let reader = hound::WavReader::new(Cursor::new(&chunk.data)).unwrap();
			assert_eq!(reader.spec(), mono_spec());
			total_frames += reader.duration();
		}
		// Full coverage: chunk frames sum to the source's frames.
		assert_eq!(total_frames, 3 * 16_000);

		let total: Duration = plan.chunks.iter().map(|c| c.duration).sum();
		assert_eq!(total, Duration::from_secs(3));
	}

	#[test]
	fn test_final_partial_chunk_is_kept() {
		let dir = tempfile::tempdir().unwrap();
		let (path, size) = write_wav(&dir, 5);

		let plan = split_wav(&path, size, size * 2 / 5).unwrap();
		assert_eq!(plan.chunk_duration, Duration::from_secs(2));
		assert_eq!(plan.chunks.len(), 3);
		assert_eq!(plan.chunks[2].duration, Duration::from_secs(1));
	}

	#[test]
	fn test_large_target_yields_single_chunk() {
		let dir = tempfile::tempdir().unwrap();
		let (path, size) = write_wav(&dir, 2);

		let plan = split_wav(&path, size, size * 10).unwrap();
		assert_eq!(plan.chunks.len(), 1);
		assert_eq!(plan.chunks[0].duration, Duration::from_secs(2));
	}

	#[test]
	fn test_chunk_duration_floors_at_one_second() {
		let dir = tempfile::tempdir().unwrap();
		let (path, size) = write_wav(&dir, 3);

		// A tiny target would yield sub-second chunks without the floor.
		let plan = split_wav(&path, size, 16).unwrap();
		assert_eq!(plan.chunk_duration, Duration::from_secs(1));
		assert_eq!(plan.chunks.len(), 3);
	}

	#[test]
	fn test_zero_duration_source_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("empty.wav");
		let writer = hound::WavWriter::create(&path, mono_spec()).unwrap();
		writer.finalize().unwrap();
		let size = std::fs::metadata(&path).unwrap().len();

		let err = split_wav(&path, size, 1024).unwrap_err();
		assert!(matches!(err, WorkerError::Chunking(_)));
	}

	#[test]
	fn test_missing_file_is_a_chunking_error() {
		let err = split_wav(Path::new("/nonexistent/audio.wav"), 100, 10).unwrap_err();
		assert!(matches!(err, WorkerError::Chunking(_)));
	}
}
