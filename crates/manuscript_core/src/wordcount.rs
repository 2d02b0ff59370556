//! Word counting for chapter content and version snapshots.
//!
//! # Responsibility
//! - Provide the single word-count definition shared by every content path.
//!
//! # Invariants
//! - `word_count` stored anywhere must equal `count_words(content)`.
//! - Counting is pure and deterministic.

/// Counts maximal non-whitespace runs in `text`.
///
/// Empty or whitespace-only input yields 0. Every path that persists content
/// or a snapshot derives its word count from this function, so stored counts
/// stay recomputable from stored text.
pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}
