//! Chapter domain model.
//!
//! # Responsibility
//! - Define the live chapter record owned by exactly one book.
//! - Provide integrity checks used by read paths.
//!
//! # Invariants
//! - `word_count` always equals `count_words(content)`.
//! - `position` is 1-based; within one book the positions of all chapters
//!   form the contiguous set `{1..N}`.

use crate::model::book::BookId;
use crate::wordcount::count_words;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a chapter.
pub type ChapterId = Uuid;

/// Live chapter state: current content plus its slot in the book's order.
///
/// History lives in [`crate::model::version::ChapterVersion`] records; this
/// struct only ever reflects the latest saved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Stable global ID.
    pub uuid: ChapterId,
    /// Owning book ID.
    pub book_uuid: BookId,
    /// User-facing title.
    pub title: String,
    /// Current full text.
    pub content: String,
    /// Word count derived from `content`.
    pub word_count: u32,
    /// 1-based slot within the owning book. Serialized as `order` to match
    /// the application's external schema naming.
    #[serde(rename = "order")]
    pub position: u32,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms of the last content, title, position, or revert write.
    pub updated_at: i64,
}

impl Chapter {
    /// Checks chapter integrity invariants.
    ///
    /// # Errors
    /// - `BlankTitle` when the title is empty after trim.
    /// - `ZeroPosition` when the 1-based position is 0.
    /// - `WordCountMismatch` when the stored count is not derivable from
    ///   the stored content.
    pub fn validate(&self) -> Result<(), ChapterValidationError> {
        if self.title.trim().is_empty() {
            return Err(ChapterValidationError::BlankTitle);
        }
        if self.position == 0 {
            return Err(ChapterValidationError::ZeroPosition);
        }
        let derived = count_words(self.content.as_str());
        if self.word_count != derived {
            return Err(ChapterValidationError::WordCountMismatch {
                stored: self.word_count,
                derived,
            });
        }
        Ok(())
    }
}

/// Integrity failures for chapter records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterValidationError {
    /// Title is empty after trim.
    BlankTitle,
    /// Position is 0; chapter order is 1-based.
    ZeroPosition,
    /// Stored word count disagrees with the count derived from content.
    WordCountMismatch { stored: u32, derived: u32 },
}

impl Display for ChapterValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "chapter title must not be blank"),
            Self::ZeroPosition => write!(f, "chapter position must be >= 1"),
            Self::WordCountMismatch { stored, derived } => write!(
                f,
                "chapter word_count {stored} does not match derived count {derived}"
            ),
        }
    }
}

impl Error for ChapterValidationError {}
