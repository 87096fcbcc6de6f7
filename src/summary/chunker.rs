//! Sentence-first text chunking under a token budget

use super::models::Chunk;
use super::token_estimator::{ScriptWeightedEstimator, TokenEstimator};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Sentence terminators: ASCII and full-width `.`, `!`, `?`
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?。！？]+").expect("sentence pattern is valid"));

/// Joins sentences inside one chunk
const SENTENCE_SEPARATOR: &str = ". ";
/// Joins words when an oversized sentence is subdivided
const WORD_SEPARATOR: &str = " ";

/// Splits oversized text into chunks that each fit a token budget.
///
/// Boundaries prefer sentence breaks, then word breaks, then character
/// breaks. A single character that exceeds the budget on its own is emitted
/// as an oversized chunk.
pub struct TextChunker<E: TokenEstimator = ScriptWeightedEstimator> {
    estimator: E,
}

impl Default for TextChunker<ScriptWeightedEstimator> {
    fn default() -> Self {
        Self::new(ScriptWeightedEstimator::default())
    }
}

impl<E: TokenEstimator> TextChunker<E> {
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }

    /// The estimator used to size chunks
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Split `text` into ordered chunks of at most `max_tokens_per_chunk`
    /// estimated tokens each.
    ///
    /// Text already within budget is returned unchanged as a single chunk.
    /// The result is never empty.
    pub fn split(&self, text: &str, max_tokens_per_chunk: usize) -> Vec<Chunk> {
        let budget = max_tokens_per_chunk.max(1);

        if self.estimator.estimate(text) <= budget {
            return vec![self.chunk(0, text.to_string())];
        }

        let mut pieces = Vec::new();
        let mut pending = Accumulator::new(SENTENCE_SEPARATOR, budget, &self.estimator);

        for sentence in SENTENCE_BREAK
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let tokens = self.estimator.estimate(sentence);
            if tokens > budget {
                pending.flush_into(&mut pieces);
                self.split_words(sentence, budget, &mut pieces);
            } else {
                pending.push(sentence, tokens, &mut pieces);
            }
        }
        pending.flush_into(&mut pieces);

        if pieces.is_empty() {
            return vec![self.chunk(0, text.to_string())];
        }

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(index, piece)| self.chunk(index, piece))
            .collect();

        debug!(
            "Split {} chars into {} chunks (budget {} tokens)",
            text.chars().count(),
            chunks.len(),
            budget
        );

        chunks
    }

    /// Greedy word-level accumulation for a sentence that exceeds the budget
    fn split_words(&self, sentence: &str, budget: usize, out: &mut Vec<String>) {
        let mut pending = Accumulator::new(WORD_SEPARATOR, budget, &self.estimator);

        for word in sentence.split_whitespace() {
            let tokens = self.estimator.estimate(word);
            if tokens > budget {
                pending.flush_into(out);
                self.split_chars(word, budget, out);
            } else {
                pending.push(word, tokens, out);
            }
        }
        pending.flush_into(out);
    }

    /// Cut a word that exceeds the budget at character boundaries. Only a
    /// single character over budget is emitted oversized.
    fn split_chars(&self, word: &str, budget: usize, out: &mut Vec<String>) {
        let mut rest = word;
        while !rest.is_empty() {
            let mut end = self.estimator.fitting_prefix(rest, budget);
            if end == 0 {
                end = rest.chars().next().map_or(rest.len(), char::len_utf8);
                warn!(
                    "Emitting oversized chunk: single character exceeds budget {}",
                    budget
                );
            }
            out.push(rest[..end].to_string());
            rest = &rest[end..];
        }
    }

    fn chunk(&self, index: usize, text: String) -> Chunk {
        let token_estimate = self.estimator.estimate(&text);
        Chunk {
            index,
            text,
            token_estimate,
        }
    }
}

/// Running chunk under construction.
///
/// `tokens` is the sum of the parts' estimates, which bounds the estimate of
/// the joined text from above for sub-additive estimators.
struct Accumulator {
    separator: &'static str,
    separator_tokens: usize,
    budget: usize,
    current: String,
    tokens: usize,
}

impl Accumulator {
    fn new<E: TokenEstimator>(separator: &'static str, budget: usize, estimator: &E) -> Self {
        Self {
            separator,
            separator_tokens: estimator.estimate(separator),
            budget,
            current: String::new(),
            tokens: 0,
        }
    }

    fn push(&mut self, piece: &str, tokens: usize, out: &mut Vec<String>) {
        if !self.current.is_empty() && self.tokens + self.separator_tokens + tokens > self.budget {
            self.flush_into(out);
        }

        if self.current.is_empty() {
            self.current.push_str(piece);
            self.tokens = tokens;
        } else {
            self.current.push_str(self.separator);
            self.current.push_str(piece);
            self.tokens += self.separator_tokens + tokens;
        }
    }

    fn flush_into(&mut self, out: &mut Vec<String>) {
        if !self.current.is_empty() {
            out.push(std::mem::take(&mut self.current));
        }
        self.tokens = 0;
    }
}
