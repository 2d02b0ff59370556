use manuscript_core::db::open_db_in_memory;
use manuscript_core::{
    ChapterId, ChapterService, SqliteChapterRepository, SqliteVersionRepository, VersionRepository,
    VersionService, VersionServiceError, AUTO_SAVE_DESCRIPTION,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn version_service(conn: &Connection) -> VersionService<SqliteVersionRepository<'_>> {
    VersionService::new(SqliteVersionRepository::try_new(conn).unwrap())
}

fn chapter_fixture(conn: &Connection) -> ChapterId {
    let service = ChapterService::new(SqliteChapterRepository::try_new(conn).unwrap());
    let book = service.create_book("Book").unwrap();
    service.create_chapter(book.uuid, "One").unwrap().uuid
}

#[test]
fn create_version_snapshots_content_and_derives_word_count() {
    let conn = setup();
    let service = version_service(&conn);
    let chapter = chapter_fixture(&conn);

    let version = service
        .create_version(chapter, "Hello world", Some("First draft"))
        .unwrap();

    assert_eq!(version.chapter_uuid, chapter);
    assert_eq!(version.content, "Hello world");
    assert_eq!(version.word_count, 2);
    assert_eq!(version.seq, 1);
    assert_eq!(version.description, "First draft");
    assert!(version.created_at > 0);

    let history = service.list_versions(chapter).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], version);
}

#[test]
fn newest_version_lists_first() {
    let conn = setup();
    let service = version_service(&conn);
    let chapter = chapter_fixture(&conn);

    let first = service.create_version(chapter, "one", None).unwrap();
    let second = service.create_version(chapter, "one two", None).unwrap();
    let third = service
        .create_version(chapter, "one two three", None)
        .unwrap();

    let history = service.list_versions(chapter).unwrap();
    let uuids: Vec<_> = history.iter().map(|version| version.uuid).collect();
    assert_eq!(uuids, vec![third.uuid, second.uuid, first.uuid]);
    assert_eq!(history[0].word_count, 3);
    assert_eq!(history[2].word_count, 1);
}

#[test]
fn missing_or_blank_description_gets_the_auto_save_label() {
    let conn = setup();
    let service = version_service(&conn);
    let chapter = chapter_fixture(&conn);

    let unnamed = service.create_version(chapter, "text", None).unwrap();
    assert_eq!(unnamed.description, AUTO_SAVE_DESCRIPTION);

    let blank = service.create_version(chapter, "text", Some("   ")).unwrap();
    assert_eq!(blank.description, AUTO_SAVE_DESCRIPTION);

    let named = service
        .create_version(chapter, "text", Some("  Before rewrite "))
        .unwrap();
    assert_eq!(named.description, "Before rewrite");
}

#[test]
fn same_millisecond_snapshots_stay_ordered_by_seq() {
    let conn = setup();
    let service = version_service(&conn);
    let chapter = chapter_fixture(&conn);

    let first = service.create_version(chapter, "one", None).unwrap();
    let second = service.create_version(chapter, "two", None).unwrap();
    let third = service.create_version(chapter, "three", None).unwrap();

    conn.execute("UPDATE chapter_versions SET created_at = 1000;", [])
        .unwrap();

    let history = service.list_versions(chapter).unwrap();
    let uuids: Vec<_> = history.iter().map(|version| version.uuid).collect();
    assert_eq!(uuids, vec![third.uuid, second.uuid, first.uuid]);
    let seqs: Vec<_> = history.iter().map(|version| version.seq).collect();
    assert_eq!(seqs, vec![3, 2, 1]);
}

#[test]
fn snapshot_timestamps_never_move_backwards() {
    let conn = setup();
    let service = version_service(&conn);
    let chapter = chapter_fixture(&conn);

    let first = service.create_version(chapter, "one", None).unwrap();
    conn.execute(
        "UPDATE chapter_versions SET created_at = 4000000000000 WHERE uuid = ?1;",
        [first.uuid.to_string()],
    )
    .unwrap();

    let second = service.create_version(chapter, "two", None).unwrap();
    assert_eq!(second.created_at, 4_000_000_000_000);
    assert_eq!(second.seq, 2);

    let history = service.list_versions(chapter).unwrap();
    let uuids: Vec<_> = history.iter().map(|version| version.uuid).collect();
    assert_eq!(uuids, vec![second.uuid, first.uuid]);
}

#[test]
fn unknown_chapter_has_an_empty_history() {
    let conn = setup();
    let service = version_service(&conn);

    let history = service.list_versions(Uuid::new_v4()).unwrap();
    assert!(history.is_empty());
}

#[test]
fn create_version_for_unknown_chapter_fails() {
    let conn = setup();
    let service = version_service(&conn);
    let unknown_chapter = Uuid::new_v4();

    let err = service
        .create_version(unknown_chapter, "text", None)
        .unwrap_err();
    assert!(matches!(
        err,
        VersionServiceError::ChapterNotFound(id) if id == unknown_chapter
    ));
}

#[test]
fn get_version_returns_none_for_unknown_id() {
    let conn = setup();
    let repo = SqliteVersionRepository::try_new(&conn).unwrap();

    assert!(repo.get_version(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn version_history_is_isolated_per_chapter() {
    let conn = setup();
    let service = version_service(&conn);
    let chapter_service = ChapterService::new(SqliteChapterRepository::try_new(&conn).unwrap());

    let book = chapter_service.create_book("Book").unwrap();
    let left = chapter_service.create_chapter(book.uuid, "Left").unwrap();
    let right = chapter_service.create_chapter(book.uuid, "Right").unwrap();

    service.create_version(left.uuid, "left text", None).unwrap();
    service
        .create_version(right.uuid, "right text", None)
        .unwrap();

    let left_history = service.list_versions(left.uuid).unwrap();
    assert_eq!(left_history.len(), 1);
    assert_eq!(left_history[0].content, "left text");
    assert_eq!(left_history[0].seq, 1);

    let right_history = service.list_versions(right.uuid).unwrap();
    assert_eq!(right_history.len(), 1);
    assert_eq!(right_history[0].content, "right text");
    assert_eq!(right_history[0].seq, 1);
}
