//! Chapter repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for books and their ordered chapters.
//! - Keep SQL details and ordering behavior inside repository boundary.
//!
//! # Invariants
//! - Within one book, chapter positions always form the contiguous set
//!   `{1..N}`; inserts append at `N+1`, removals close the gap, reorders
//!   shift the affected range inside one transaction.
//! - Chapter listing is deterministic: `position ASC, uuid ASC`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::book::{Book, BookId};
use crate::model::chapter::{Chapter, ChapterId, ChapterValidationError};
use crate::model::version::{VersionId, VersionValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CHAPTER_SELECT_SQL: &str = "SELECT
    uuid,
    book_uuid,
    title,
    content,
    word_count,
    position,
    created_at,
    updated_at
FROM chapters";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from book/chapter/version persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Persisted chapter row fails integrity checks.
    ChapterValidation(ChapterValidationError),
    /// Persisted version row fails integrity checks.
    VersionValidation(VersionValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced book does not exist.
    BookNotFound(BookId),
    /// Referenced chapter does not exist.
    ChapterNotFound(ChapterId),
    /// Referenced version does not exist or belongs to another chapter.
    VersionNotFound(VersionId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChapterValidation(err) => write!(f, "{err}"),
            Self::VersionValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::ChapterNotFound(id) => write!(f, "chapter not found: {id}"),
            Self::VersionNotFound(id) => write!(f, "chapter version not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ChapterValidation(err) => Some(err),
            Self::VersionValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChapterValidationError> for RepoError {
    fn from(value: ChapterValidationError) -> Self {
        Self::ChapterValidation(value)
    }
}

impl From<VersionValidationError> for RepoError {
    fn from(value: VersionValidationError) -> Self {
        Self::VersionValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for book and chapter persistence.
pub trait ChapterRepository {
    /// Creates one book.
    fn create_book(&self, title: &str) -> RepoResult<Book>;
    /// Creates one chapter at the end of the book's order.
    fn insert_chapter(&self, book_uuid: BookId, title: &str) -> RepoResult<Chapter>;
    /// Loads one chapter by id.
    fn get_chapter(&self, chapter_uuid: ChapterId) -> RepoResult<Option<Chapter>>;
    /// Lists one book's chapters in position order.
    fn list_chapters_by_book(&self, book_uuid: BookId) -> RepoResult<Vec<Chapter>>;
    /// Atomically replaces one chapter's live content and word count.
    fn set_chapter_content(
        &self,
        chapter_uuid: ChapterId,
        content: &str,
        word_count: u32,
    ) -> RepoResult<()>;
    /// Renames one chapter.
    fn rename_chapter(&self, chapter_uuid: ChapterId, title: &str) -> RepoResult<()>;
    /// Moves one chapter to a target position, shifting the affected range.
    fn reorder_chapter(&self, chapter_uuid: ChapterId, new_position: u32) -> RepoResult<()>;
    /// Deletes one chapter and closes the position gap it leaves.
    fn remove_chapter(&self, chapter_uuid: ChapterId) -> RepoResult<()>;
}

/// SQLite-backed chapter repository.
pub struct SqliteChapterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChapterRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_chapter_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ChapterRepository for SqliteChapterRepository<'_> {
    fn create_book(&self, title: &str) -> RepoResult<Book> {
        let book_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO books (uuid, title) VALUES (?1, ?2);",
            params![book_uuid.to_string(), title],
        )?;
        load_required_book(self.conn, book_uuid)
    }

    fn insert_chapter(&self, book_uuid: BookId, title: &str) -> RepoResult<Chapter> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_book_exists(&tx, book_uuid)?;

        let chapter_uuid = Uuid::new_v4();
        let position = next_position(&tx, book_uuid)?;
        tx.execute(
            "INSERT INTO chapters (
                uuid,
                book_uuid,
                title,
                content,
                word_count,
                position
            ) VALUES (?1, ?2, ?3, '', 0, ?4);",
            params![
                chapter_uuid.to_string(),
                book_uuid.to_string(),
                title,
                i64::from(position),
            ],
        )?;

        let chapter = load_required_chapter(&tx, chapter_uuid)?;
        tx.commit()?;
        Ok(chapter)
    }

    fn get_chapter(&self, chapter_uuid: ChapterId) -> RepoResult<Option<Chapter>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHAPTER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([chapter_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_chapter_row(row)?));
        }
        Ok(None)
    }

    fn list_chapters_by_book(&self, book_uuid: BookId) -> RepoResult<Vec<Chapter>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CHAPTER_SELECT_SQL}
             WHERE book_uuid = ?1
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([book_uuid.to_string()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_chapter_row(row)?);
        }
        Ok(items)
    }

    fn set_chapter_content(
        &self,
        chapter_uuid: ChapterId,
        content: &str,
        word_count: u32,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE chapters
             SET content = ?2,
                 word_count = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![chapter_uuid.to_string(), content, i64::from(word_count)],
        )?;
        if changed == 0 {
            return Err(RepoError::ChapterNotFound(chapter_uuid));
        }
        Ok(())
    }

    fn rename_chapter(&self, chapter_uuid: ChapterId, title: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE chapters
             SET title = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![chapter_uuid.to_string(), title],
        )?;
        if changed == 0 {
            return Err(RepoError::ChapterNotFound(chapter_uuid));
        }
        Ok(())
    }

    fn reorder_chapter(&self, chapter_uuid: ChapterId, new_position: u32) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let (book_uuid, old_position) = chapter_placement(&tx, chapter_uuid)?;
        let chapter_count = count_book_chapters(&tx, book_uuid)?;
        // Clamp against the count read under the same lock as the shift.
        let target = new_position.clamp(1, chapter_count);

        if target < old_position {
            tx.execute(
                "UPDATE chapters
                 SET position = position + 1,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE book_uuid = ?1
                   AND position >= ?2
                   AND position < ?3;",
                params![
                    book_uuid.to_string(),
                    i64::from(target),
                    i64::from(old_position),
                ],
            )?;
        } else if target > old_position {
            tx.execute(
                "UPDATE chapters
                 SET position = position - 1,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE book_uuid = ?1
                   AND position > ?2
                   AND position <= ?3;",
                params![
                    book_uuid.to_string(),
                    i64::from(old_position),
                    i64::from(target),
                ],
            )?;
        }

        if target != old_position {
            tx.execute(
                "UPDATE chapters
                 SET position = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![chapter_uuid.to_string(), i64::from(target)],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn remove_chapter(&self, chapter_uuid: ChapterId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let (book_uuid, old_position) = chapter_placement(&tx, chapter_uuid)?;
        // Version rows ride the FK cascade.
        tx.execute(
            "DELETE FROM chapters WHERE uuid = ?1;",
            [chapter_uuid.to_string()],
        )?;
        tx.execute(
            "UPDATE chapters
             SET position = position - 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE book_uuid = ?1
               AND position > ?2;",
            params![book_uuid.to_string(), i64::from(old_position)],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn load_required_book(conn: &Connection, book_uuid: BookId) -> RepoResult<Book> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title, created_at, updated_at
         FROM books
         WHERE uuid = ?1;",
    )?;
    let mut rows = stmt.query([book_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_book_row(row);
    }
    Err(RepoError::BookNotFound(book_uuid))
}

fn load_required_chapter(conn: &Connection, chapter_uuid: ChapterId) -> RepoResult<Chapter> {
    let mut stmt = conn.prepare(&format!("{CHAPTER_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([chapter_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_chapter_row(row);
    }
    Err(RepoError::ChapterNotFound(chapter_uuid))
}

fn ensure_book_exists(conn: &Connection, book_uuid: BookId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM books
            WHERE uuid = ?1
        );",
        [book_uuid.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        return Ok(());
    }
    Err(RepoError::BookNotFound(book_uuid))
}

fn chapter_placement(conn: &Connection, chapter_uuid: ChapterId) -> RepoResult<(BookId, u32)> {
    let placement = conn
        .query_row(
            "SELECT book_uuid, position
             FROM chapters
             WHERE uuid = ?1;",
            [chapter_uuid.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    match placement {
        Some((book_uuid_text, position)) => {
            let book_uuid = parse_uuid(&book_uuid_text, "chapters.book_uuid")?;
            let position = u32::try_from(position).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid position value `{position}` in chapters.position"
                ))
            })?;
            Ok((book_uuid, position))
        }
        None => Err(RepoError::ChapterNotFound(chapter_uuid)),
    }
}

fn count_book_chapters(conn: &Connection, book_uuid: BookId) -> RepoResult<u32> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM chapters
         WHERE book_uuid = ?1;",
        [book_uuid.to_string()],
        |row| row.get(0),
    )?;
    u32::try_from(count).map_err(|_| {
        RepoError::InvalidData(format!("invalid chapter count `{count}` for book {book_uuid}"))
    })
}

fn next_position(conn: &Connection, book_uuid: BookId) -> RepoResult<u32> {
    let next: i64 = conn.query_row(
        "SELECT COUNT(*) + 1
         FROM chapters
         WHERE book_uuid = ?1;",
        [book_uuid.to_string()],
        |row| row.get(0),
    )?;
    u32::try_from(next).map_err(|_| {
        RepoError::InvalidData(format!("invalid next position `{next}` for book {book_uuid}"))
    })
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "books.uuid")?;

    Ok(Book {
        uuid,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_chapter_row(row: &Row<'_>) -> RepoResult<Chapter> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "chapters.uuid")?;

    let book_uuid_text: String = row.get("book_uuid")?;
    let book_uuid = parse_uuid(&book_uuid_text, "chapters.book_uuid")?;

    let chapter = Chapter {
        uuid,
        book_uuid,
        title: row.get("title")?,
        content: row.get("content")?,
        word_count: read_u32(row, "word_count")?,
        position: read_u32(row, "position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    chapter.validate()?;
    Ok(chapter)
}

fn read_u32(row: &Row<'_>, column: &'static str) -> RepoResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid {column} value `{value}` in chapters"))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_chapter_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "books")? {
        return Err(RepoError::MissingRequiredTable("books"));
    }
    if !table_exists(conn, "chapters")? {
        return Err(RepoError::MissingRequiredTable("chapters"));
    }

    for column in [
        "uuid",
        "book_uuid",
        "title",
        "content",
        "word_count",
        "position",
        "created_at",
        "updated_at",
    ] {
        if !table_has_column(conn, "chapters", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "chapters",
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
