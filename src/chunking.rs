//! Text splitting for course documents.
//!
//! Breaks course text into overlapping chunks for embedding, preferring
//! paragraph breaks, then line breaks, then word boundaries. Only text
//! larger than the chunk size is split at all.

use std::collections::VecDeque;

/// Separators tried in order when breaking up oversized text.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Configuration for the text splitter.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Trailing characters carried into the next chunk.
    pub chunk_overlap: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Split text into chunks of at most `chunk_size` characters.
pub fn split_text(text: &str, config: &SplitConfig) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    split_recursive(text, &SEPARATORS, config)
        .into_iter()
        .map(|chunk| chunk.trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Joined length of the pieces currently buffered for one chunk.
fn buffered_len(pieces: &VecDeque<String>, sep_len: usize) -> usize {
    let content: usize = pieces.iter().map(|p| char_len(p)).sum();
    content + sep_len * pieces.len().saturating_sub(1)
}

fn join_pieces(pieces: &VecDeque<String>, sep: &str) -> String {
    pieces
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}

fn split_recursive(text: &str, separators: &[&str], config: &SplitConfig) -> Vec<String> {
    if char_len(text) <= config.chunk_size {
        return vec![text.to_string()];
    }

    // First listed separator present in the text wins.
    let (sep, rest) = match separators.iter().position(|s| text.contains(s)) {
        Some(i) => (separators[i], &separators[i + 1..]),
        None => return hard_cut(text, config),
    };
    let sep_len = char_len(sep);

    let mut chunks: Vec<String> = Vec::new();
    let mut current: VecDeque<String> = VecDeque::new();
    // Whether the buffer holds anything beyond carried overlap.
    let mut fresh = false;

    for piece in text.split(sep).filter(|p| !p.is_empty()) {
        let piece_len = char_len(piece);

        if piece_len > config.chunk_size {
            if fresh {
                chunks.push(join_pieces(&current, sep));
            }
            current.clear();
            fresh = false;
            chunks.extend(split_recursive(piece, rest, config));
            continue;
        }

        if fresh && buffered_len(&current, sep_len) + sep_len + piece_len > config.chunk_size {
            chunks.push(join_pieces(&current, sep));
            current = overlap_tail(&current, sep_len, config.chunk_overlap);
            fresh = false;
        }

        // Drop carried pieces from the front until the new piece fits.
        while !current.is_empty()
            && buffered_len(&current, sep_len) + sep_len + piece_len > config.chunk_size
        {
            current.pop_front();
        }

        current.push_back(piece.to_string());
        fresh = true;
    }

    if fresh {
        chunks.push(join_pieces(&current, sep));
    }

    chunks
}

/// Trailing pieces of a finished chunk, totalling at most `overlap` characters.
fn overlap_tail(pieces: &VecDeque<String>, sep_len: usize, overlap: usize) -> VecDeque<String> {
    let mut carried: VecDeque<String> = VecDeque::new();
    let mut carried_len = 0;

    for piece in pieces.iter().rev() {
        let added = char_len(piece) + if carried.is_empty() { 0 } else { sep_len };
        if carried_len + added > overlap {
            break;
        }
        carried_len += added;
        carried.push_front(piece.clone());
    }

    carried
}

/// Cut text with no usable separators at character boundaries.
fn hard_cut(text: &str, config: &SplitConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = config
        .chunk_size
        .saturating_sub(config.chunk_overlap)
        .max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
