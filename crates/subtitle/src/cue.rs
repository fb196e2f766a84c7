use crate::error::SubtitleError;
use std::fmt::Write as _;
use std::time::Duration;

/// One timestamped subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
	pub index: usize,
	pub start: Duration,
	pub end: Duration,
	pub text: String,
}

impl Cue {
	pub fn shift(&mut self, offset: Duration) {
		self.start += offset;
		self.end += offset;
	}
}

/// Parses an SRT document into cues.
///
/// Blocks are separated by blank lines. Each block is an index line, a
/// `HH:MM:SS,mmm --> HH:MM:SS,mmm` timing line, and one or more text lines.
///
/// # Errors
/// Returns an error when an index or timestamp cannot be parsed, when a
/// block has no timing line, or when a cue ends before it starts.
pub fn parse(input: &str) -> Result<Vec<Cue>, SubtitleError> {
	let normalized = input.replace("\r\n", "\n");
	let mut cues = Vec::new();

	for (block_no, block) in normalized.split("\n\n").enumerate() {
		let block = block.trim();
		if block.is_empty() {
			continue;
		}

		let mut lines = block.lines();
		let index_line = lines.next().unwrap_or_default().trim();
		let index = index_line.parse::<usize>().map_err(|_| SubtitleError::InvalidIndex(index_line.to_string()))?;

		let timing_line = lines.next().ok_or(SubtitleError::MissingTimingLine { block: block_no })?;
		let (start_raw, end_raw) = timing_line
			.split_once("-->")
			.ok_or(SubtitleError::MissingTimingLine { block: block_no })?;

		let start = parse_timestamp(start_raw.trim())?;
		let end = parse_timestamp(end_raw.trim())?;
		if end < start {
			return Err(SubtitleError::NegativeDuration {
				start: start_raw.trim().to_string(),
				end: end_raw.trim().to_string(),
			});
		}

		let text = lines.collect::<Vec<_>>().join("\n");

		cues.push(Cue { index, start, end, text });
	}

	Ok(cues)
}

/// Serializes cues back into an SRT document. Empty input yields an empty string.
#[must_use]
pub fn compose(cues: &[Cue]) -> String {
	let mut out = String::new();
	for cue in cues {
		let _ = write!(
			out,
			"{}\n{} --> {}\n{}\n\n",
			cue.index,
			format_timestamp(cue.start),
			format_timestamp(cue.end),
			cue.text
		);
	}
	out
}

fn parse_timestamp(raw: &str) -> Result<Duration, SubtitleError> {
	let invalid = || SubtitleError::InvalidTimestamp(raw.to_string());

	// HH:MM:SS,mmm with a comma separator; a dot is tolerated.
	let (clock, millis_raw) = raw.split_once(',').or_else(|| raw.split_once('.')).ok_or_else(invalid)?;

	let mut parts = clock.splitn(3, ':');
	let hours = parts.next().and_then(|p| p.parse::<u64>().ok()).ok_or_else(invalid)?;
	let minutes = parts.next().and_then(|p| p.parse::<u64>().ok()).ok_or_else(invalid)?;
	let seconds = parts.next().and_then(|p| p.parse::<u64>().ok()).ok_or_else(invalid)?;
	let millis = millis_raw.parse::<u64>().map_err(|_| invalid())?;

	if minutes > 59 || seconds > 59 || millis > 999 {
		return Err(invalid());
	}

	Ok(Duration::from_millis(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis))
}

fn format_timestamp(value: Duration) -> String {
	let total_millis = value.as_millis();
	let millis = total_millis % 1000;
	let total_seconds = total_millis / 1000;
	let seconds = total_seconds % 60;
	let minutes = (total_seconds / 60) % 60;
	let hours = total_seconds / 3600;

	format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
