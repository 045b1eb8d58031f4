//! Password strength scoring
//!
//! [`PasswordScorer`] is the seam the update path calls; [`EntropyScorer`]
//! is the built-in implementation. It estimates entropy as
//! `length * log2(base)` where `base` is the size of the character pool
//! the password draws from and `length` ignores long repeats and runs of
//! well-known sequences.

use thiserror::Error;

/// Rejection raised by a scorer
#[derive(Error, Debug, Clone, PartialEq)]
#[error("insecure password: {entropy:.1} bits of entropy, {required:.1} required")]
pub struct WeakPassword {
    /// Estimated entropy of the submitted password
    pub entropy: f64,
    /// Threshold it had to reach
    pub required: f64,
}

/// Trait for password strength scorers
pub trait PasswordScorer: Send + Sync {
    /// Accept the password if it reaches `min_bits` of entropy
    fn validate(&self, password: &str, min_bits: f64) -> Result<(), WeakPassword>;
}

/// Characters commonly substituted for letters
const REPLACE_CHARS: &str = "!@$&*";
/// Separator characters
const SEP_CHARS: &str = "_-., ";
/// Remaining ASCII punctuation
const OTHER_SPECIAL_CHARS: &str = "\"#%'()+/:;<=>?[\\]^{|}~";
const LOWER_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGIT_CHARS: &str = "0123456789";

/// Sequences whose runs longer than two count as two characters
const SEQUENCES: [&str; 6] = [
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "1qaz2wsx3edc4rfv5tgb6yhn7ujm8ik9ol0p",
];

/// Longest run of repeats or sequence steps that counts in full
const MAX_RUN: usize = 2;

/// Entropy-based scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyScorer;

impl EntropyScorer {
    /// Create a new scorer
    pub fn new() -> Self {
        Self
    }

    /// Estimated entropy of `password` in bits
    pub fn entropy(password: &str) -> f64 {
        let base = character_pool(password);
        if base == 0 {
            return 0.0;
        }
        effective_length(password) as f64 * (base as f64).log2()
    }
}

impl PasswordScorer for EntropyScorer {
    fn validate(&self, password: &str, min_bits: f64) -> Result<(), WeakPassword> {
        let entropy = Self::entropy(password);
        if entropy >= min_bits {
            Ok(())
        } else {
            Err(WeakPassword {
                entropy,
                required: min_bits,
            })
        }
    }
}

/// Size of the character pool a password draws from
///
/// Each character class present contributes its full size. Characters
/// outside every class contribute one each (counted once per distinct
/// character).
fn character_pool(password: &str) -> usize {
    let classes = [
        REPLACE_CHARS,
        SEP_CHARS,
        OTHER_SPECIAL_CHARS,
        LOWER_CHARS,
        UPPER_CHARS,
        DIGIT_CHARS,
    ];

    let mut present = [false; 6];
    let mut others: Vec<char> = Vec::new();

    for c in password.chars() {
        match classes.iter().position(|class| class.contains(c)) {
            Some(idx) => present[idx] = true,
            None if !others.contains(&c) => others.push(c),
            None => {}
        }
    }

    let from_classes: usize = classes
        .iter()
        .zip(present)
        .filter(|(_, used)| *used)
        .map(|(class, _)| class.chars().count())
        .sum();

    from_classes + others.len()
}

/// Length after discounting repeats and sequence runs
fn effective_length(password: &str) -> usize {
    let mut chars = collapse_repeats(password.chars().collect());
    for sequence in SEQUENCES {
        let forward: Vec<char> = sequence.chars().collect();
        let backward: Vec<char> = forward.iter().rev().copied().collect();
        chars = collapse_sequence(chars, &forward);
        chars = collapse_sequence(chars, &backward);
    }
    chars.len()
}

/// Keep at most [`MAX_RUN`] identical characters in a row
fn collapse_repeats(chars: Vec<char>) -> Vec<char> {
    let mut kept = Vec::with_capacity(chars.len());
    let mut prev: Option<char> = None;
    let mut run = 0;

    for c in chars {
        run = if prev == Some(c) { run + 1 } else { 1 };
        prev = Some(c);
        if run <= MAX_RUN {
            kept.push(c);
        }
    }
    kept
}

/// Keep at most [`MAX_RUN`] consecutive steps of `sequence`
fn collapse_sequence(chars: Vec<char>, sequence: &[char]) -> Vec<char> {
    let mut kept = Vec::with_capacity(chars.len());
    let mut prev: Option<char> = None;
    let mut run = 0;

    for c in chars {
        let steps = prev.is_some_and(|p| follows(sequence, p, c));
        run = if steps { run + 1 } else { 1 };
        prev = Some(c);
        if run <= MAX_RUN {
            kept.push(c);
        }
    }
    kept
}

/// Whether `next` directly follows `prev` in `sequence` (ASCII case-insensitive)
fn follows(sequence: &[char], prev: char, next: char) -> bool {
    let prev = prev.to_ascii_lowercase();
    let next = next.to_ascii_lowercase();
    sequence
        .windows(2)
        .any(|pair| pair[0] == prev && pair[1] == next)
}
