//! Chapter use-case service.
//!
//! # Responsibility
//! - Provide book/chapter create, read, edit, reorder, and remove APIs.
//! - Normalize titles and derive word counts before persistence.
//!
//! # Invariants
//! - Titles are trimmed; blank titles never reach the repository.
//! - `save_content` recomputes `word_count` from the saved text.
//! - Ordering changes go through the repository's transactional shift.

use crate::model::book::{Book, BookId};
use crate::model::chapter::{Chapter, ChapterId};
use crate::repo::chapter_repo::{ChapterRepository, RepoError, RepoResult};
use crate::wordcount::count_words;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for book/chapter use-cases.
#[derive(Debug)]
pub enum ChapterServiceError {
    /// Title input is empty after trimming.
    InvalidTitle,
    /// Target book does not exist.
    BookNotFound(BookId),
    /// Target chapter does not exist.
    ChapterNotFound(ChapterId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ChapterServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::BookNotFound(book_id) => write!(f, "book not found: {book_id}"),
            Self::ChapterNotFound(chapter_id) => write!(f, "chapter not found: {chapter_id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent chapter state: {details}"),
        }
    }
}

impl Error for ChapterServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ChapterServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::BookNotFound(book_id) => Self::BookNotFound(book_id),
            RepoError::ChapterNotFound(chapter_id) => Self::ChapterNotFound(chapter_id),
            other => Self::Repo(other),
        }
    }
}

/// Chapter service facade over repository implementations.
pub struct ChapterService<R: ChapterRepository> {
    repo: R,
}

impl<R: ChapterRepository> ChapterService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one book with a trimmed, non-blank title.
    pub fn create_book(&self, title: impl Into<String>) -> Result<Book, ChapterServiceError> {
        let title = normalize_title(title.into())?;
        Ok(self.repo.create_book(title.as_str())?)
    }

    /// Creates one chapter appended at the end of the book's order.
    ///
    /// # Contract
    /// - New chapters start with empty content and `word_count = 0`.
    /// - The new position is `existing chapter count + 1`.
    pub fn create_chapter(
        &self,
        book_uuid: BookId,
        title: impl Into<String>,
    ) -> Result<Chapter, ChapterServiceError> {
        let title = normalize_title(title.into())?;
        Ok(self.repo.insert_chapter(book_uuid, title.as_str())?)
    }

    /// Gets one chapter by stable ID.
    pub fn get_chapter(&self, chapter_uuid: ChapterId) -> RepoResult<Option<Chapter>> {
        self.repo.get_chapter(chapter_uuid)
    }

    /// Lists one book's chapters sorted by position.
    pub fn list_chapters(&self, book_uuid: BookId) -> RepoResult<Vec<Chapter>> {
        self.repo.list_chapters_by_book(book_uuid)
    }

    /// Replaces chapter content fully and recomputes the stored word count.
    pub fn save_content(
        &self,
        chapter_uuid: ChapterId,
        content: impl Into<String>,
    ) -> Result<Chapter, ChapterServiceError> {
        let content = content.into();
        let word_count = count_words(content.as_str());
        self.repo
            .set_chapter_content(chapter_uuid, content.as_str(), word_count)?;
        self.repo
            .get_chapter(chapter_uuid)?
            .ok_or(ChapterServiceError::InconsistentState(
                "chapter missing after content save",
            ))
    }

    /// Renames one chapter with a trimmed, non-blank title.
    pub fn rename_chapter(
        &self,
        chapter_uuid: ChapterId,
        title: impl Into<String>,
    ) -> Result<Chapter, ChapterServiceError> {
        let title = normalize_title(title.into())?;
        self.repo.rename_chapter(chapter_uuid, title.as_str())?;
        self.repo
            .get_chapter(chapter_uuid)?
            .ok_or(ChapterServiceError::InconsistentState(
                "chapter missing after rename",
            ))
    }

    /// Moves one chapter to a target position.
    ///
    /// # Contract
    /// - Targets outside `1..=chapter_count` are clamped to the nearest end.
    /// - Every affected sibling shifts by one inside the same transaction.
    /// - Positions remain exactly `1..=chapter_count` afterwards.
    pub fn reorder_chapter(
        &self,
        chapter_uuid: ChapterId,
        new_position: u32,
    ) -> Result<(), ChapterServiceError> {
        self.repo
            .reorder_chapter(chapter_uuid, new_position)
            .map_err(Into::into)
    }

    /// Removes one chapter and closes the position gap it leaves.
    pub fn remove_chapter(&self, chapter_uuid: ChapterId) -> Result<(), ChapterServiceError> {
        self.repo.remove_chapter(chapter_uuid).map_err(Into::into)
    }
}

fn normalize_title(value: String) -> Result<String, ChapterServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ChapterServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
