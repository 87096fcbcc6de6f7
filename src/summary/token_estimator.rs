//! Local token estimation by script-weighted character counting

use super::token_budget::{BudgetError, TokenBudgetConfig};

/// Token estimator trait for different estimation strategies
///
/// Implementations must be pure, total and sub-additive:
/// `estimate(a + b) <= estimate(a) + estimate(b)`.
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens in the given text
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for multiple texts
    fn estimate_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.estimate(t)).collect()
    }

    /// Byte length of the longest char-aligned prefix of `text` whose
    /// estimate fits `budget`. Relies on estimates never shrinking as text
    /// grows.
    fn fitting_prefix(&self, text: &str, budget: usize) -> usize {
        let ends: Vec<usize> = text
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();

        // number of leading chars that fit
        let (mut lo, mut hi) = (0, ends.len());
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.estimate(&text[..ends[mid - 1]]) <= budget {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        if lo == 0 { 0 } else { ends[lo - 1] }
    }
}

/// Character-weighting estimator that charges CJK/Hangul characters more
/// than everything else.
#[derive(Debug, Clone, Copy)]
pub struct ScriptWeightedEstimator {
    dense_weight: f64,
    other_weight: f64,
}

impl ScriptWeightedEstimator {
    /// Create an estimator with explicit per-character weights
    pub fn new(dense_weight: f64, other_weight: f64) -> Result<Self, BudgetError> {
        let config = TokenBudgetConfig {
            dense_token_weight: dense_weight,
            other_token_weight: other_weight,
            ..Default::default()
        };
        Self::from_config(&config)
    }

    /// Create an estimator from the budget configuration
    pub fn from_config(config: &TokenBudgetConfig) -> Result<Self, BudgetError> {
        config.validate()?;
        Ok(Self {
            dense_weight: config.dense_token_weight,
            other_weight: config.other_token_weight,
        })
    }
}

impl Default for ScriptWeightedEstimator {
    fn default() -> Self {
        Self {
            dense_weight: 1.5,
            other_weight: 0.25,
        }
    }
}

impl TokenEstimator for ScriptWeightedEstimator {
    fn estimate(&self, text: &str) -> usize {
        let (dense, other) = text.chars().fold((0usize, 0usize), |(d, o), c| {
            if is_dense_script(c) {
                (d + 1, o)
            } else {
                (d, o + 1)
            }
        });

        (dense as f64 * self.dense_weight + other as f64 * self.other_weight).ceil() as usize
    }
}

/// CJK, Hangul and Japanese kana code points
pub fn is_dense_script(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x11FF     // Hangul Jamo
        | 0x3000..=0x303F   // CJK Symbols and Punctuation
        | 0x3040..=0x30FF   // Hiragana, Katakana
        | 0x3130..=0x318F   // Hangul Compatibility Jamo
        | 0x3400..=0x4DBF   // CJK Extension A
        | 0x4E00..=0x9FFF   // CJK Unified Ideographs
        | 0xAC00..=0xD7AF   // Hangul Syllables
        | 0xF900..=0xFAFF   // CJK Compatibility Ideographs
        | 0xFF00..=0xFFEF   // Halfwidth and Fullwidth Forms
    )
}
