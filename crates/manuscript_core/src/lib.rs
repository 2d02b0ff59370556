//! Core domain logic for Manuscript.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod wordcount;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::book::{Book, BookId};
pub use model::chapter::{Chapter, ChapterId, ChapterValidationError};
pub use model::version::{ChapterVersion, VersionId, VersionValidationError};
pub use repo::chapter_repo::{
    ChapterRepository, RepoError, RepoResult, SqliteChapterRepository,
};
pub use repo::version_repo::{SqliteVersionRepository, VersionRepository};
pub use service::chapter_service::{ChapterService, ChapterServiceError};
pub use service::revert_service::{RevertService, RevertServiceError};
pub use service::version_service::{VersionService, VersionServiceError, AUTO_SAVE_DESCRIPTION};
pub use wordcount::count_words;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
