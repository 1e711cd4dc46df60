//! Sentence-based text chunking with overlap.

use regex::Regex;

/// Packs whole sentences into chunks of bounded character length.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    sentence_break: Regex,
}

impl SentenceChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        // Terminator followed by whitespace; the next letter decides
        let sentence_break = Regex::new(r"[.!?]\s+").expect("Invalid regex");

        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            sentence_break,
        }
    }

    /// Split text into sentences.
    ///
    /// A sentence ends at `.`, `!` or `?` followed by whitespace and an
    /// uppercase letter.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for m in self.sentence_break.find_iter(text) {
            let next_upper = text[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase());
            if !next_upper {
                continue;
            }
            // Keep the terminator, drop the whitespace
            let sentence = text[start..m.start() + 1].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = m.end();
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
        sentences
    }

    /// Chunk text. A sentence longer than `chunk_size` becomes its own chunk;
    /// trailing sentences totalling at most `chunk_overlap` characters are
    /// repeated at the start of the next chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let sentences = self.split_sentences(&normalized);

        let mut chunks = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let mut size = 0;
            let mut taken: Vec<&str> = Vec::new();

            for sentence in &sentences[i..] {
                let addition = sentence.chars().count() + usize::from(!taken.is_empty());
                if size + addition > self.chunk_size && !taken.is_empty() {
                    break;
                }
                taken.push(sentence);
                size += addition;
            }

            chunks.push(taken.join(" "));
            if i + taken.len() >= sentences.len() {
                break;
            }

            let mut overlap_size = 0;
            let mut overlap_count = 0;
            for (k, sentence) in taken.iter().enumerate().rev() {
                let len = sentence.chars().count() + usize::from(k + 1 < taken.len());
                if overlap_size + len > self.chunk_overlap {
                    break;
                }
                overlap_size += len;
                overlap_count += 1;
            }

            i = (i + taken.len() - overlap_count).max(i + 1);
        }

        chunks
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(800, 100)
    }
}
