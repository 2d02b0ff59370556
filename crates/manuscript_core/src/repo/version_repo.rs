//! Chapter version repository: append-only snapshot history and revert.
//!
//! # Responsibility
//! - Append and list immutable chapter snapshots.
//! - Apply revert as one transaction over live content and history.
//!
//! # Invariants
//! - History rows are never updated or deleted here; removal happens only
//!   through the owning chapter's FK cascade.
//! - `(created_at, seq)` of a new snapshot sorts strictly after every
//!   existing snapshot of the same chapter, even for same-millisecond
//!   writes.
//! - Version listing is deterministic: `created_at DESC, seq DESC`.

use crate::db::migrations::latest_version;
use crate::model::chapter::ChapterId;
use crate::model::version::{ChapterVersion, VersionId};
use crate::repo::chapter_repo::{RepoError, RepoResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const VERSION_SELECT_SQL: &str = "SELECT
    uuid,
    chapter_uuid,
    content,
    word_count,
    seq,
    description,
    created_at
FROM chapter_versions";

/// Repository interface for chapter snapshot history.
pub trait VersionRepository {
    /// Appends one snapshot for an existing chapter.
    fn insert_version(
        &self,
        chapter_uuid: ChapterId,
        content: &str,
        word_count: u32,
        description: &str,
    ) -> RepoResult<ChapterVersion>;
    /// Loads one snapshot by id.
    fn get_version(&self, version_uuid: VersionId) -> RepoResult<Option<ChapterVersion>>;
    /// Lists one chapter's snapshots, most recent first. An unknown chapter
    /// yields an empty list, never an error.
    fn list_versions(&self, chapter_uuid: ChapterId) -> RepoResult<Vec<ChapterVersion>>;
    /// Reverts the chapter's live row to the target snapshot and appends the
    /// resulting revert snapshot, as one transaction.
    fn apply_revert(
        &self,
        chapter_uuid: ChapterId,
        version_uuid: VersionId,
        description: &str,
    ) -> RepoResult<ChapterVersion>;
}

/// SQLite-backed version repository.
pub struct SqliteVersionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVersionRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_version_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl VersionRepository for SqliteVersionRepository<'_> {
    fn insert_version(
        &self,
        chapter_uuid: ChapterId,
        content: &str,
        word_count: u32,
        description: &str,
    ) -> RepoResult<ChapterVersion> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_chapter_exists(&tx, chapter_uuid)?;
        let version = append_version_row(&tx, chapter_uuid, content, word_count, description)?;
        tx.commit()?;
        Ok(version)
    }

    fn get_version(&self, version_uuid: VersionId) -> RepoResult<Option<ChapterVersion>> {
        load_version(self.conn, version_uuid)
    }

    fn list_versions(&self, chapter_uuid: ChapterId) -> RepoResult<Vec<ChapterVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VERSION_SELECT_SQL}
             WHERE chapter_uuid = ?1
             ORDER BY created_at DESC, seq DESC;"
        ))?;
        let mut rows = stmt.query([chapter_uuid.to_string()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_version_row(row)?);
        }
        Ok(items)
    }

    fn apply_revert(
        &self,
        chapter_uuid: ChapterId,
        version_uuid: VersionId,
        description: &str,
    ) -> RepoResult<ChapterVersion> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        // Ownership is re-checked under the transaction lock.
        let target = load_version(&tx, version_uuid)?
            .ok_or(RepoError::VersionNotFound(version_uuid))?;
        if target.chapter_uuid != chapter_uuid {
            return Err(RepoError::VersionNotFound(version_uuid));
        }

        let changed = tx.execute(
            "UPDATE chapters
             SET content = ?2,
                 word_count = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                chapter_uuid.to_string(),
                target.content.as_str(),
                i64::from(target.word_count),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ChapterNotFound(chapter_uuid));
        }

        let revert_version = append_version_row(
            &tx,
            chapter_uuid,
            target.content.as_str(),
            target.word_count,
            description,
        )?;
        tx.commit()?;
        Ok(revert_version)
    }
}

fn append_version_row(
    conn: &Connection,
    chapter_uuid: ChapterId,
    content: &str,
    word_count: u32,
    description: &str,
) -> RepoResult<ChapterVersion> {
    let version_uuid = Uuid::new_v4();
    let (created_at, seq) = next_history_slot(conn, chapter_uuid)?;
    conn.execute(
        "INSERT INTO chapter_versions (
            uuid,
            chapter_uuid,
            content,
            word_count,
            seq,
            description,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            version_uuid.to_string(),
            chapter_uuid.to_string(),
            content,
            i64::from(word_count),
            seq,
            description,
            created_at,
        ],
    )?;
    load_required_version(conn, version_uuid)
}

/// Assigns the next `(created_at, seq)` pair for one chapter's history.
///
/// `created_at` never moves backwards even when the wall clock does; `seq`
/// keeps the total order unambiguous when two snapshots share a millisecond.
fn next_history_slot(conn: &Connection, chapter_uuid: ChapterId) -> RepoResult<(i64, i64)> {
    let (max_created_at, max_seq): (i64, i64) = conn.query_row(
        "SELECT COALESCE(MAX(created_at), 0), COALESCE(MAX(seq), 0)
         FROM chapter_versions
         WHERE chapter_uuid = ?1;",
        [chapter_uuid.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let now = Utc::now().timestamp_millis();
    Ok((now.max(max_created_at), max_seq + 1))
}

fn ensure_chapter_exists(conn: &Connection, chapter_uuid: ChapterId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM chapters
            WHERE uuid = ?1
        );",
        [chapter_uuid.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        return Ok(());
    }
    Err(RepoError::ChapterNotFound(chapter_uuid))
}

fn load_version(conn: &Connection, version_uuid: VersionId) -> RepoResult<Option<ChapterVersion>> {
    let mut stmt = conn.prepare(&format!("{VERSION_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([version_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_version_row(row)?));
    }
    Ok(None)
}

fn load_required_version(conn: &Connection, version_uuid: VersionId) -> RepoResult<ChapterVersion> {
    load_version(conn, version_uuid)?.ok_or(RepoError::VersionNotFound(version_uuid))
}

fn parse_version_row(row: &Row<'_>) -> RepoResult<ChapterVersion> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "chapter_versions.uuid")?;

    let chapter_uuid_text: String = row.get("chapter_uuid")?;
    let chapter_uuid = parse_uuid(&chapter_uuid_text, "chapter_versions.chapter_uuid")?;

    let word_count: i64 = row.get("word_count")?;
    let word_count = u32::try_from(word_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid word_count value `{word_count}` in chapter_versions.word_count"
        ))
    })?;

    let version = ChapterVersion {
        uuid,
        chapter_uuid,
        content: row.get("content")?,
        word_count,
        seq: row.get("seq")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    };
    version.validate()?;
    Ok(version)
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_version_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "chapters")? {
        return Err(RepoError::MissingRequiredTable("chapters"));
    }
    if !table_exists(conn, "chapter_versions")? {
        return Err(RepoError::MissingRequiredTable("chapter_versions"));
    }

    for column in [
        "uuid",
        "chapter_uuid",
        "content",
        "word_count",
        "seq",
        "description",
        "created_at",
    ] {
        if !table_has_column(conn, "chapter_versions", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "chapter_versions",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
