//! Version use-case service.
//!
//! # Responsibility
//! - Snapshot chapter content into the append-only version history.
//! - List one chapter's history, most recent first.
//!
//! # Invariants
//! - `word_count` of a snapshot is always derived from its own content.
//! - Blank descriptions fall back to [`AUTO_SAVE_DESCRIPTION`].
//! - Listing an unknown chapter yields an empty history, never an error.

use crate::model::chapter::ChapterId;
use crate::model::version::ChapterVersion;
use crate::repo::chapter_repo::{RepoError, RepoResult};
use crate::repo::version_repo::VersionRepository;
use crate::wordcount::count_words;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Description applied when a snapshot is created without one.
pub const AUTO_SAVE_DESCRIPTION: &str = "Auto-saved version";

/// Service error for version use-cases.
#[derive(Debug)]
pub enum VersionServiceError {
    /// Target chapter does not exist.
    ChapterNotFound(ChapterId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for VersionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChapterNotFound(chapter_id) => write!(f, "chapter not found: {chapter_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VersionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VersionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ChapterNotFound(chapter_id) => Self::ChapterNotFound(chapter_id),
            other => Self::Repo(other),
        }
    }
}

/// Version service facade over repository implementations.
pub struct VersionService<R: VersionRepository> {
    repo: R,
}

impl<R: VersionRepository> VersionService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Snapshots one chapter's content into its history.
    ///
    /// # Contract
    /// - `word_count` is computed from `content`, not taken from the caller.
    /// - `description` is trimmed; `None` or blank becomes
    ///   [`AUTO_SAVE_DESCRIPTION`].
    /// - Returns the appended snapshot.
    pub fn create_version(
        &self,
        chapter_uuid: ChapterId,
        content: impl Into<String>,
        description: Option<&str>,
    ) -> Result<ChapterVersion, VersionServiceError> {
        let content = content.into();
        let word_count = count_words(content.as_str());
        let label = normalize_description(description);
        Ok(self
            .repo
            .insert_version(chapter_uuid, content.as_str(), word_count, label.as_str())?)
    }

    /// Lists one chapter's snapshots, most recent first.
    pub fn list_versions(&self, chapter_uuid: ChapterId) -> RepoResult<Vec<ChapterVersion>> {
        self.repo.list_versions(chapter_uuid)
    }
}

fn normalize_description(description: Option<&str>) -> String {
    match description.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => AUTO_SAVE_DESCRIPTION.to_string(),
    }
}
