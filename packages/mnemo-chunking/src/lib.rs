use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

/// Split points tried in order, from paragraph breaks down to single spaces.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// Sizes are counted in characters.
#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub chunk_size: usize,
	pub chunk_overlap: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
	pub chunk_index: u32,
	pub text: String,
}

/// Splits `text` into trimmed, non-empty chunks of at most `chunk_size` characters.
///
/// The coarsest separator present in the text is used first; pieces that are still too long
/// are split again with the next separator, down to grapheme clusters. Adjacent pieces are
/// merged back up to `chunk_size`, and each new chunk starts with up to `chunk_overlap`
/// characters carried over from the end of the previous one.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
	if cfg.chunk_size == 0 {
		return Vec::new();
	}

	split_recursive(text, SEPARATORS, cfg)
		.into_iter()
		.map(|piece| piece.trim().to_string())
		.filter(|piece| !piece.is_empty())
		.enumerate()
		.map(|(idx, text)| Chunk { chunk_index: idx as u32, text })
		.collect()
}

fn split_recursive(text: &str, separators: &[&str], cfg: &ChunkingConfig) -> Vec<String> {
	let (splits, remaining, graphemes): (Vec<&str>, &[&str], bool) =
		match separators.iter().position(|sep| text.contains(sep)) {
			Some(pos) => (text.split_inclusive(separators[pos]).collect(), &separators[pos + 1..], false),
			None => (text.graphemes(true).collect(), &[], true),
		};
	let mut chunks = Vec::new();
	let mut pending = Vec::new();

	for split in splits {
		if char_len(split) <= cfg.chunk_size {
			pending.push(split);

			continue;
		}
		if !pending.is_empty() {
			chunks.extend(merge_splits(&pending, cfg));
			pending.clear();
		}
		if graphemes {
			tracing::debug!(
				grapheme_chars = char_len(split),
				chunk_size = cfg.chunk_size,
				"Grapheme cluster exceeds chunk size; emitting it whole."
			);
			chunks.push(split.to_string());
		} else {
			chunks.extend(split_recursive(split, remaining, cfg));
		}
	}

	if !pending.is_empty() {
		chunks.extend(merge_splits(&pending, cfg));
	}

	chunks
}

fn merge_splits(splits: &[&str], cfg: &ChunkingConfig) -> Vec<String> {
	let mut chunks = Vec::new();
	let mut window: VecDeque<&str> = VecDeque::new();
	let mut total = 0_usize;

	for split in splits {
		let len = char_len(split);

		if total + len > cfg.chunk_size && !window.is_empty() {
			chunks.push(window.iter().copied().collect::<String>());

			while total > cfg.chunk_overlap || (total > 0 && total + len > cfg.chunk_size) {
				let Some(front) = window.pop_front() else {
					break;
				};

				total -= char_len(front);
			}
		}

		window.push_back(split);

		total += len;
	}

	if !window.is_empty() {
		chunks.push(window.iter().copied().collect::<String>());
	}

	chunks
}

fn char_len(text: &str) -> usize {
	text.chars().count()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prefers_paragraph_breaks() {
		let cfg = ChunkingConfig { chunk_size: 12, chunk_overlap: 0 };
		let chunks = split_text("para one.\n\npara two.", &cfg);
		let texts = chunks.iter().map(|chunk| chunk.text.as_str()).collect::<Vec<_>>();

		assert_eq!(texts, vec!["para one.", "para two."]);
	}

	#[test]
	fn falls_back_to_graphemes_without_separators() {
		let cfg = ChunkingConfig { chunk_size: 10, chunk_overlap: 0 };
		let chunks = split_text(&"a".repeat(25), &cfg);
		let lens = chunks.iter().map(|chunk| chunk.text.len()).collect::<Vec<_>>();

		assert_eq!(lens, vec![10, 10, 5]);
	}

	#[test]
	fn indexes_are_sequential() {
		let cfg = ChunkingConfig { chunk_size: 8, chunk_overlap: 0 };
		let chunks = split_text("one two three four five six", &cfg);

		for (expected, chunk) in chunks.iter().enumerate() {
			assert_eq!(chunk.chunk_index, expected as u32);
		}
	}
}
