#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A piece of document text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    /// Position of this chunk within its document.
    pub chunk_index: usize,
    /// Estimated token count
    pub token_count: usize,
}

/// Configuration for content chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens
    pub target_chunk_size: usize,
    /// Maximum chunk size in tokens before forced splitting
    pub max_chunk_size: usize,
    /// Minimum chunk size in tokens (smaller chunks will be merged)
    pub min_chunk_size: usize,
    /// Overlap size in tokens between adjacent chunks
    pub overlap_size: usize,
    /// Whether to break at sentence boundaries when possible
    pub sentence_boundary_splitting: bool,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            target_chunk_size: 650,
            max_chunk_size: 1000,
            min_chunk_size: 100,
            overlap_size: 50,
            sentence_boundary_splitting: true,
        }
    }
}

/// Chunk document text into embedding-ready pieces.
///
/// Whitespace-only input yields no chunks; callers decide whether that is
/// an error.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let token_count = estimate_token_count(text);

    // Small documents become a single chunk
    let splits = if token_count <= config.target_chunk_size {
        vec![text.trim().to_string()]
    } else {
        split_by_paragraphs(text, config)
    };

    let mut chunks = splits
        .into_iter()
        .filter(|split| !split.trim().is_empty())
        .map(|split| {
            let token_count = estimate_token_count(&split);
            TextChunk {
                content: split,
                chunk_index: 0,
                token_count,
            }
        })
        .collect::<Vec<_>>();

    chunks = merge_small_chunks(chunks, config);

    if config.overlap_size > 0 {
        add_overlap(&mut chunks, config);
    }

    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.chunk_index = i;
    }

    debug!(
        "Chunked {} estimated tokens into {} chunks",
        token_count,
        chunks.len()
    );

    chunks
}

/// Split text at paragraph boundaries, falling back to sentences and then
/// words for paragraphs that exceed the maximum size on their own.
fn split_by_paragraphs(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut splits = Vec::new();
    let mut current_split = String::new();
    let mut current_token_count = 0;

    for paragraph in text.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }

        let paragraph_tokens = estimate_token_count(paragraph);

        if paragraph_tokens > config.max_chunk_size {
            let pieces = if config.sentence_boundary_splitting {
                split_by_sentences(paragraph, config)
            } else {
                split_by_words(paragraph, config)
            };

            for piece in pieces {
                if current_token_count + estimate_token_count(&piece) > config.target_chunk_size
                    && !current_split.trim().is_empty()
                {
                    splits.push(current_split.trim().to_string());
                    current_split.clear();
                    current_token_count = 0;
                }
                current_split.push_str(&piece);
                current_split.push_str("\n\n");
                current_token_count += estimate_token_count(&piece);
            }
        } else {
            if current_token_count + paragraph_tokens > config.target_chunk_size
                && !current_split.trim().is_empty()
            {
                splits.push(current_split.trim().to_string());
                current_split.clear();
                current_token_count = 0;
            }

            current_split.push_str(paragraph);
            current_split.push_str("\n\n");
            current_token_count += paragraph_tokens;
        }
    }

    if !current_split.trim().is_empty() {
        splits.push(current_split.trim().to_string());
    }

    splits
}

/// Split text by sentences
fn split_by_sentences(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut splits = Vec::new();
    let mut current_split = String::new();
    let mut current_token_count = 0;

    let sentences = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    for (i, sentence) in sentences.iter().enumerate() {
        let sentence_with_punct = if i < sentences.len() - 1 {
            format!("{}. ", sentence)
        } else {
            (*sentence).to_string()
        };

        let sentence_tokens = estimate_token_count(&sentence_with_punct);

        if current_token_count + sentence_tokens > config.target_chunk_size
            && !current_split.trim().is_empty()
        {
            splits.push(current_split.trim().to_string());
            current_split.clear();
            current_token_count = 0;
        }

        current_split.push_str(&sentence_with_punct);
        current_token_count += sentence_tokens;
    }

    if !current_split.trim().is_empty() {
        splits.push(current_split.trim().to_string());
    }

    splits
}

/// Split text by words as a last resort
fn split_by_words(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut splits = Vec::new();
    let mut current_split = String::new();
    let mut current_token_count = 0;

    for word in text.split_whitespace() {
        let word_with_space = format!("{} ", word);
        let word_tokens = estimate_token_count(&word_with_space);

        if current_token_count + word_tokens > config.target_chunk_size
            && !current_split.trim().is_empty()
        {
            splits.push(current_split.trim().to_string());
            current_split.clear();
            current_token_count = 0;
        }

        current_split.push_str(&word_with_space);
        current_token_count += word_tokens;
    }

    if !current_split.trim().is_empty() {
        splits.push(current_split.trim().to_string());
    }

    splits
}

/// Merge chunks below the minimum size into their predecessor when the
/// result stays within the maximum.
fn merge_small_chunks(chunks: Vec<TextChunk>, config: &ChunkingConfig) -> Vec<TextChunk> {
    let mut processed: Vec<TextChunk> = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        if chunk.token_count < config.min_chunk_size {
            if let Some(previous) = processed.last_mut() {
                if previous.token_count + chunk.token_count <= config.max_chunk_size {
                    previous.content.push_str("\n\n");
                    previous.content.push_str(&chunk.content);
                    previous.token_count += chunk.token_count;
                    continue;
                }
            }
        }
        processed.push(chunk);
    }

    processed
}

/// Prepend the tail of each chunk to its successor so context survives the
/// chunk boundary.
fn add_overlap(chunks: &mut [TextChunk], config: &ChunkingConfig) {
    let mut i = 1;
    while i < chunks.len() {
        let (left, right) = chunks.split_at_mut(i);
        let prev_chunk = &left[i - 1];
        let curr_chunk = &mut right[0];

        let overlap_text = extract_overlap_text(&prev_chunk.content, config.overlap_size);
        if !overlap_text.is_empty() {
            curr_chunk.content = format!("{}\n\n{}", overlap_text, curr_chunk.content);
            curr_chunk.token_count += estimate_token_count(&overlap_text);
        }
        i += 1;
    }
}

/// Extract overlap text from the end of a chunk
fn extract_overlap_text(content: &str, overlap_tokens: usize) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let word_count = (overlap_tokens as f64 * 0.75) as usize; // Rough word-to-token ratio

    if words.len() <= word_count {
        return String::new();
    }

    words[words.len() - word_count.min(words.len())..].join(" ")
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
