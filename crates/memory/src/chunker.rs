//! Chunker — splits the normalized history into overlapping passages.
//!
//! Works on characters, not bytes. Each window is cut at the latest
//! occurrence of the most preferred separator that fits, and the next
//! window starts `chunk_overlap` characters before that cut, so every pair
//! of consecutive chunks shares exactly `chunk_overlap` characters.

use nomi_core::error::Error;

/// The single chunk produced for empty input, so the index is never empty.
pub const NO_HISTORY_PLACEHOLDER: &str = "No historical data available.";

/// Paragraph break, line break, space, then a hard cut.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Vec<char>>,
}

impl Chunker {
    /// Create a chunker with the default separators.
    ///
    /// Fails when `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, Error> {
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be > 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.chars().collect()).collect(),
        })
    }

    /// Replace the separator preference list.
    pub fn with_separators<S: AsRef<str>>(mut self, separators: &[S]) -> Self {
        self.separators = separators
            .iter()
            .map(|s| s.as_ref().chars().collect())
            .collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered chunks of at most `chunk_size` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![NO_HISTORY_PLACEHOLDER.to_string()];
        }

        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            if chars.len() - start <= self.chunk_size {
                chunks.push(chars[start..].iter().collect());
                break;
            }

            let window_end = start + self.chunk_size;
            // Cutting at or before this point would stall the window.
            let min_cut = start + self.chunk_overlap + 1;
            let cut = self.find_cut(&chars, min_cut, window_end);

            chunks.push(chars[start..cut].iter().collect());
            start = cut - self.chunk_overlap;
        }

        chunks
    }

    /// End index of the best boundary inside `[min_cut, window_end]`.
    fn find_cut(&self, chars: &[char], min_cut: usize, window_end: usize) -> usize {
        for sep in &self.separators {
            if sep.is_empty() {
                return window_end;
            }
            let len = sep.len();
            if window_end < len {
                continue;
            }
            let mut pos = window_end - len;
            loop {
                if pos + len < min_cut {
                    break;
                }
                if chars[pos..pos + len] == sep[..] {
                    return pos + len;
                }
                if pos == 0 {
                    break;
                }
                pos -= 1;
            }
        }
        window_end
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.chars().collect()).collect(),
        }
    }
}
