//! Chapter version snapshot model.
//!
//! # Responsibility
//! - Define the immutable history record appended on every save and revert.
//!
//! # Invariants
//! - Records are append-only: never mutated or deleted while the chapter
//!   lives.
//! - `(created_at, seq)` sorts strictly after every earlier version of the
//!   same chapter, even for same-millisecond writes.

use crate::model::chapter::ChapterId;
use crate::wordcount::count_words;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a chapter version.
pub type VersionId = Uuid;

/// One full-content snapshot in a chapter's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterVersion {
    /// Stable global ID.
    pub uuid: VersionId,
    /// Chapter this snapshot belongs to; immutable once written.
    pub chapter_uuid: ChapterId,
    /// Full content at snapshot time.
    pub content: String,
    /// Word count derived from `content` at snapshot time.
    pub word_count: u32,
    /// Per-chapter insertion counter breaking `created_at` ties.
    pub seq: i64,
    /// Human-readable label, e.g. "Auto-saved version".
    pub description: String,
    /// Epoch ms, assigned monotonically per chapter.
    pub created_at: i64,
}

impl ChapterVersion {
    /// Checks snapshot integrity invariants.
    pub fn validate(&self) -> Result<(), VersionValidationError> {
        if self.seq < 1 {
            return Err(VersionValidationError::NonPositiveSeq(self.seq));
        }
        let derived = count_words(self.content.as_str());
        if self.word_count != derived {
            return Err(VersionValidationError::WordCountMismatch {
                stored: self.word_count,
                derived,
            });
        }
        Ok(())
    }
}

/// Integrity failures for version records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionValidationError {
    /// Sequence counters start at 1.
    NonPositiveSeq(i64),
    /// Stored word count disagrees with the count derived from content.
    WordCountMismatch { stored: u32, derived: u32 },
}

impl Display for VersionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveSeq(seq) => {
                write!(f, "version seq must be >= 1, got {seq}")
            }
            Self::WordCountMismatch { stored, derived } => write!(
                f,
                "version word_count {stored} does not match derived count {derived}"
            ),
        }
    }
}

impl Error for VersionValidationError {}
