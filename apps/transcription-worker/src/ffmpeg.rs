use crate::error::WorkerError;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Converts an input media file to 16 kHz mono 16-bit PCM WAV via the
/// external `ffmpeg` binary.
///
/// # Errors
/// Returns `WorkerError::Conversion` carrying ffmpeg's diagnostic output on
/// non-zero exit, a missing binary, or a missing output file.
pub async fn convert_to_wav(input: &Path, output: &Path) -> Result<(), WorkerError> {
	debug!(input = %input.display(), output = %output.display(), "Starting FFmpeg conversion");
	let started = Instant::now();

	let result = Command::new("ffmpeg")
		.arg("-nostdin")
		.arg("-y")
		.arg("-i")
		.arg(input)
		.args(["-ar", "16000", "-ac", "1", "-sample_fmt", "s16", "-vn"])
		.arg(output)
		.output()
		.await;

	let process_output = match result {
		Ok(out) => out,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			return Err(WorkerError::Conversion {
				stderr: "ffmpeg command not found".to_string(),
			});
		}
		Err(e) => {
			return Err(WorkerError::Conversion { stderr: e.to_string() });
		}
	};

	if !process_output.status.success() {
		let stderr = String::from_utf8_lossy(&process_output.stderr).trim().to_string();
		return Err(WorkerError::Conversion { stderr });
	}

	if !tokio::fs::try_exists(output).await.unwrap_or(false) {
		return Err(WorkerError::Conversion {
			stderr: "conversion finished but output file not found".to_string(),
		});
	}

	info!(elapsed = ?started.elapsed(), "FFmpeg conversion finished");
	Ok(())
}
