use crate::cue::{compose, parse};
use std::time::Duration;

/// Merges ordered per-chunk SRT results into one continuous document.
///
/// `pieces` holds one entry per planned chunk, in chunk order: `Some(srt)`
/// for a chunk that transcribed, `None` for a failed or skipped chunk.
/// A single cursor tracks the timeline offset for the next chunk. A chunk
/// that parses to at least one cue has every cue shifted by the current
/// cursor, and the cursor is then re-anchored to the shifted end of its
/// last cue. A failed, unparseable, or empty chunk only advances the
/// cursor by the planned duration.
///
/// Returns an empty string when no chunk produced any cue, which is a
/// valid outcome for silent audio.
#[must_use]
pub fn stitch(pieces: &[Option<String>], planned_chunk: Duration) -> String {
	let mut cursor = Duration::ZERO;
	let mut merged = Vec::new();

	for piece in pieces {
		let Some(text) = piece else {
			cursor += planned_chunk;
			continue;
		};

		let Ok(mut cues) = parse(text) else {
			cursor += planned_chunk;
			continue;
		};

		if cues.is_empty() {
			cursor += planned_chunk;
			continue;
		}

		for cue in &mut cues {
			cue.shift(cursor);
		}
		// Re-anchor to ground truth: the actual end of this chunk's last cue.
		cursor = cues.last().map_or(cursor, |c| c.end);
		merged.extend(cues);
	}

	if merged.is_empty() {
		return String::new();
	}

	merged.sort_by_key(|cue| cue.start);
	for (i, cue) in merged.iter_mut().enumerate() {
		cue.index = i + 1;
	}

	compose(&merged)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cue::Cue;

	fn srt(entries: &[(u64, u64, &str)]) -> String {
		let cues: Vec<Cue> = entries
			.iter()
			.enumerate()
			.map(|(i, &(start_ms, end_ms, text))| Cue {
				index: i + 1,
				start: Duration::from_millis(start_ms),
				end: Duration::from_millis(end_ms),
				text: text.to_string(),
			})
			.collect();
		compose(&cues)
	}

	#[test]
	fn test_single_chunk_passes_through() {
		let piece = srt(&[(0, 1000, "a"), (1500, 2000, "b")]);
		let merged = stitch(&[Some(piece.clone())], Duration::from_secs(10));
		assert_eq!(merged, piece);
	}

	#[test]
	fn test_failed_middle_chunk_advances_by_planned_duration() {
		// Chunk 1 ends at 8s, chunk 2 fails, chunk 3 starts at its own 0s.
		let chunk1 = srt(&[(1000, 8000, "one")]);
		let chunk3 = srt(&[(0, 2000, "three")]);
		let merged = stitch(&[Some(chunk1), None, Some(chunk3)], Duration::from_secs(10));

		let cues = parse(&merged).unwrap();
		assert_eq!(cues.len(), 2);
		// Chunk 1 keeps its original times.
		assert_eq!(cues[0].start, Duration::from_secs(1));
		assert_eq!(cues[0].end, Duration::from_secs(8));
		// Chunk 3 is offset by chunk 1's actual end plus the planned 10s,
		// not by 20s flat.
		assert_eq!(cues[1].start, Duration::from_secs(18));
		assert_eq!(cues[1].end, Duration::from_secs(20));
	}

	#[test]
	fn test_successful_chunk_reanchors_cursor() {
		// Chunk 1's last cue ends at 9.5s even though 10s were planned;
		// chunk 2 must start relative to 9.5s.
		let chunk1 = srt(&[(0, 9500, "one")]);
		let chunk2 = srt(&[(500, 3000, "two")]);
		let merged = stitch(&[Some(chunk1), Some(chunk2)], Duration::from_secs(10));

		let cues = parse(&merged).unwrap();
		assert_eq!(cues[1].start, Duration::from_millis(10_000));
		assert_eq!(cues[1].end, Duration::from_millis(12_500));
	}

	#[test]
	fn test_unparseable_chunk_is_treated_as_failed() {
		let chunk1 = srt(&[(0, 4000, "one")]);
		let chunk3 = srt(&[(0, 1000, "three")]);
		let merged = stitch(
			&[Some(chunk1), Some("not valid srt".to_string()), Some(chunk3)],
			Duration::from_secs(5),
		);

		let cues = parse(&merged).unwrap();
		assert_eq!(cues.len(), 2);
		assert_eq!(cues[1].start, Duration::from_secs(9));
	}

	#[test]
	fn test_empty_chunk_advances_cursor() {
		let chunk2 = srt(&[(0, 1000, "late")]);
		let merged = stitch(&[Some(String::new()), Some(chunk2)], Duration::from_secs(7));

		let cues = parse(&merged).unwrap();
		assert_eq!(cues.len(), 1);
		assert_eq!(cues[0].start, Duration::from_secs(7));
	}

	#[test]
	fn test_all_failed_yields_empty_string() {
		assert_eq!(stitch(&[None, None, None], Duration::from_secs(10)), "");
		assert_eq!(stitch(&[], Duration::from_secs(10)), "");
	}

	#[test]
	fn test_indices_are_contiguous_and_starts_non_decreasing() {
		let chunk1 = srt(&[(2000, 3000, "b"), (0, 1000, "a")]);
		let chunk2 = srt(&[(0, 500, "c"), (600, 900, "d")]);
		let merged = stitch(&[Some(chunk1), Some(chunk2)], Duration::from_secs(4));

		let cues = parse(&merged).unwrap();
		for (i, cue) in cues.iter().enumerate() {
			assert_eq!(cue.index, i + 1);
		}
		for pair in cues.windows(2) {
			assert!(pair[0].start <= pair[1].start);
		}
	}

	#[test]
	fn test_stitch_is_idempotent() {
		let pieces = vec![Some(srt(&[(0, 2000, "a")])), None, Some(srt(&[(100, 900, "b")]))];
		let first = stitch(&pieces, Duration::from_secs(10));
		let second = stitch(&pieces, Duration::from_secs(10));
		assert_eq!(first, second);
	}
}
