use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubtitleError {
	#[error("Invalid cue index: {0}")]
	InvalidIndex(String),

	#[error("Invalid timestamp: {0}")]
	InvalidTimestamp(String),

	#[error("Cue block {block} is missing its timing line")]
	MissingTimingLine { block: usize },

	#[error("Cue ends before it starts: {start} --> {end}")]
	NegativeDuration { start: String, end: String },
}
