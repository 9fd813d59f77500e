use mnemo_chunking::{ChunkingConfig, split_text};

fn numbered_words(count: usize) -> String {
	(0..count).map(|idx| format!("w{idx}")).collect::<Vec<_>>().join(" ")
}

#[test]
fn short_text_is_a_single_chunk() {
	let cfg = ChunkingConfig { chunk_size: 1_000, chunk_overlap: 200 };
	let chunks = split_text("  A short note about breakfast.  ", &cfg);

	assert_eq!(chunks.len(), 1);
	assert_eq!(chunks[0].text, "A short note about breakfast.");
}

#[test]
fn blank_text_has_no_chunks() {
	let cfg = ChunkingConfig { chunk_size: 1_000, chunk_overlap: 200 };

	assert!(split_text(" \n\n \t", &cfg).is_empty());
}

#[test]
fn chunks_never_exceed_chunk_size() {
	let cfg = ChunkingConfig { chunk_size: 50, chunk_overlap: 10 };
	let text = format!("{}\n\n{}\n{}", numbered_words(120), numbered_words(40), "x".repeat(130));

	for chunk in split_text(&text, &cfg) {
		assert!(chunk.text.chars().count() <= 50, "oversized chunk: {:?}", chunk.text);
	}
}

#[test]
fn consecutive_chunks_overlap() {
	let cfg = ChunkingConfig { chunk_size: 50, chunk_overlap: 10 };
	let chunks = split_text(&numbered_words(100), &cfg);

	assert!(chunks.len() > 2);

	for pair in chunks.windows(2) {
		let first_word = pair[1].text.split(' ').next().unwrap_or_default();

		assert!(
			pair[0].text.split(' ').any(|word| word == first_word),
			"{:?} does not carry over into {:?}",
			pair[0].text,
			pair[1].text
		);
	}
}

#[test]
fn zero_overlap_preserves_every_word_once() {
	let cfg = ChunkingConfig { chunk_size: 40, chunk_overlap: 0 };
	let text = numbered_words(80);
	let chunks = split_text(&text, &cfg);
	let rejoined = chunks
		.iter()
		.flat_map(|chunk| chunk.text.split(' ').map(str::to_string).collect::<Vec<_>>())
		.collect::<Vec<_>>();

	assert_eq!(rejoined, text.split(' ').map(str::to_string).collect::<Vec<_>>());
}

#[test]
fn counts_characters_not_bytes() {
	let cfg = ChunkingConfig { chunk_size: 4, chunk_overlap: 0 };
	let chunks = split_text("ééééé", &cfg);

	assert_eq!(chunks.len(), 2);
	assert_eq!(chunks[0].text, "éééé");
}
