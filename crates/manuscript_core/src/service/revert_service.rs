//! Revert use-case service.
//!
//! # Responsibility
//! - Restore a chapter's live content from one of its own snapshots.
//! - Record the restore itself as a new history entry.
//!
//! # Invariants
//! - A snapshot can only be applied to the chapter it belongs to.
//! - Live-content overwrite and history append happen in one repository
//!   transaction; a failed append leaves the chapter untouched.
//! - The recorded description names the source snapshot's creation time.

use crate::model::chapter::ChapterId;
use crate::model::version::{ChapterVersion, VersionId};
use crate::repo::chapter_repo::RepoError;
use crate::repo::version_repo::VersionRepository;
use chrono::{LocalResult, TimeZone, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for revert use-cases.
#[derive(Debug)]
pub enum RevertServiceError {
    /// Target snapshot does not exist.
    VersionNotFound(VersionId),
    /// Target snapshot belongs to a different chapter.
    VersionNotOwned {
        /// Snapshot the caller asked to restore.
        version_uuid: VersionId,
        /// Chapter the caller asked to restore into.
        chapter_uuid: ChapterId,
    },
    /// Target chapter does not exist.
    ChapterNotFound(ChapterId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RevertServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionNotFound(version_id) => write!(f, "version not found: {version_id}"),
            Self::VersionNotOwned {
                version_uuid,
                chapter_uuid,
            } => write!(
                f,
                "version {version_uuid} does not belong to chapter {chapter_uuid}"
            ),
            Self::ChapterNotFound(chapter_id) => write!(f, "chapter not found: {chapter_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RevertServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RevertServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::VersionNotFound(version_id) => Self::VersionNotFound(version_id),
            RepoError::ChapterNotFound(chapter_id) => Self::ChapterNotFound(chapter_id),
            other => Self::Repo(other),
        }
    }
}

/// Revert service facade over repository implementations.
pub struct RevertService<R: VersionRepository> {
    repo: R,
}

impl<R: VersionRepository> RevertService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Restores `chapter_uuid`'s live content from `version_uuid`.
    ///
    /// # Contract
    /// - The snapshot must belong to the chapter, otherwise
    ///   [`RevertServiceError::VersionNotOwned`] and nothing is written.
    /// - Content overwrite and the "Reverted to version from ..." history
    ///   entry are one transaction.
    /// - Returns the newly appended history entry.
    pub fn revert_to_version(
        &self,
        chapter_uuid: ChapterId,
        version_uuid: VersionId,
    ) -> Result<ChapterVersion, RevertServiceError> {
        let target = self
            .repo
            .get_version(version_uuid)?
            .ok_or(RevertServiceError::VersionNotFound(version_uuid))?;
        if target.chapter_uuid != chapter_uuid {
            return Err(RevertServiceError::VersionNotOwned {
                version_uuid,
                chapter_uuid,
            });
        }

        let description = format!(
            "Reverted to version from {}",
            format_revert_timestamp(target.created_at)
        );
        let revert_version = self
            .repo
            .apply_revert(chapter_uuid, version_uuid, description.as_str())?;
        info!(
            "event=chapter_revert module=service status=ok chapter={} source_version={} new_version={}",
            chapter_uuid, version_uuid, revert_version.uuid
        );
        Ok(revert_version)
    }
}

/// Renders a snapshot timestamp for revert descriptions.
///
/// Out-of-range epoch values fall back to the raw millisecond count instead
/// of failing the revert.
fn format_revert_timestamp(epoch_ms: i64) -> String {
    match Utc.timestamp_millis_opt(epoch_ms) {
        LocalResult::Single(moment) => moment.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => format!("epoch_ms {epoch_ms}"),
    }
}

#[cfg(test)]
mod tests {
    use super::format_revert_timestamp;

    #[test]
    fn timestamp_renders_as_utc_wall_clock() {
        assert_eq!(
            format_revert_timestamp(1_700_000_000_000),
            "2023-11-14 22:13:20 UTC"
        );
    }

    #[test]
    fn timestamp_falls_back_for_out_of_range_values() {
        assert_eq!(
            format_revert_timestamp(i64::MAX),
            format!("epoch_ms {}", i64::MAX)
        );
    }
}
