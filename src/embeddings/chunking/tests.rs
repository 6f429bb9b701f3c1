use super::*;

fn sentence(i: usize) -> String {
    format!(
        "This is sentence number {} with a handful of filler words to give it weight.",
        i
    )
}

fn long_text(paragraphs: usize, sentences_per_paragraph: usize) -> String {
    (0..paragraphs)
        .map(|p| {
            (0..sentences_per_paragraph)
                .map(|s| sentence(p * sentences_per_paragraph + s))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn empty_text_produces_no_chunks() {
    let config = ChunkingConfig::default();

    assert!(chunk_text("", &config).is_empty());
    assert!(chunk_text("   \n\n  ", &config).is_empty());
}

#[test]
fn small_text_becomes_a_single_chunk() {
    let config = ChunkingConfig::default();
    let text = "A short document about nothing in particular.";

    let chunks = chunk_text(text, &config);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, text);
    assert_eq!(chunks[0].chunk_index, 0);
}

#[test]
fn long_text_is_split_into_multiple_chunks() {
    let config = ChunkingConfig {
        target_chunk_size: 120,
        max_chunk_size: 200,
        min_chunk_size: 50,
        overlap_size: 0,
        sentence_boundary_splitting: true,
    };
    let text = long_text(12, 4);

    let chunks = chunk_text(&text, &config);

    assert!(chunks.len() > 1, "expected multiple chunks");
    for chunk in &chunks {
        assert!(
            chunk.token_count <= config.max_chunk_size,
            "chunk of {} tokens exceeds max",
            chunk.token_count
        );
    }
}

#[test]
fn chunk_indexes_are_sequential() {
    let config = ChunkingConfig {
        target_chunk_size: 120,
        max_chunk_size: 200,
        min_chunk_size: 50,
        overlap_size: 0,
        sentence_boundary_splitting: true,
    };

    let chunks = chunk_text(&long_text(12, 4), &config);

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
    }
}

#[test]
fn oversized_paragraph_is_split_at_sentence_boundaries() {
    let config = ChunkingConfig {
        target_chunk_size: 100,
        max_chunk_size: 150,
        min_chunk_size: 50,
        overlap_size: 0,
        sentence_boundary_splitting: true,
    };
    // One paragraph, far larger than max_chunk_size.
    let text = (0..40).map(sentence).collect::<Vec<_>>().join(" ");

    let chunks = chunk_text(&text, &config);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.token_count <= config.max_chunk_size);
    }
}

#[test]
fn tiny_trailing_chunk_is_merged_into_predecessor() {
    let config = ChunkingConfig {
        target_chunk_size: 120,
        max_chunk_size: 400,
        min_chunk_size: 50,
        overlap_size: 0,
        sentence_boundary_splitting: true,
    };
    // One paragraph just past the target, then a tail far below the
    // minimum: the splitter emits the tail as its own chunk, and the merge
    // pass folds it back into its predecessor.
    let mut text = (0..7).map(sentence).collect::<Vec<_>>().join(" ");
    text.push_str("\n\nTiny tail.");

    let chunks = chunk_text(&text, &config);

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].token_count >= config.min_chunk_size);
    assert!(chunks[0].content.contains("Tiny tail."));
}

#[test]
fn overlap_carries_previous_chunk_tail_forward() {
    let config = ChunkingConfig {
        target_chunk_size: 120,
        max_chunk_size: 200,
        min_chunk_size: 20,
        overlap_size: 40,
        sentence_boundary_splitting: true,
    };

    let chunks = chunk_text(&long_text(12, 4), &config);
    assert!(chunks.len() > 1);

    let first_tail = chunks[0]
        .content
        .split_whitespace()
        .next_back()
        .expect("first chunk has words");
    assert!(
        chunks[1].content.contains(first_tail),
        "second chunk should start with the tail of the first"
    );
}

#[test]
fn token_estimate_tracks_word_count() {
    assert_eq!(estimate_token_count(""), 0);

    let ten_words = "one two three four five six seven eight nine ten";
    let estimate = estimate_token_count(ten_words);
    assert!((10..=20).contains(&estimate), "estimate was {}", estimate);
}
