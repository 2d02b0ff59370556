use manuscript_core::db::open_db_in_memory;
use manuscript_core::{
    Chapter, ChapterService, RevertService, RevertServiceError, SqliteChapterRepository,
    SqliteVersionRepository, VersionService,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn chapter_service(conn: &Connection) -> ChapterService<SqliteChapterRepository<'_>> {
    ChapterService::new(SqliteChapterRepository::try_new(conn).unwrap())
}

fn version_service(conn: &Connection) -> VersionService<SqliteVersionRepository<'_>> {
    VersionService::new(SqliteVersionRepository::try_new(conn).unwrap())
}

fn revert_service(conn: &Connection) -> RevertService<SqliteVersionRepository<'_>> {
    RevertService::new(SqliteVersionRepository::try_new(conn).unwrap())
}

fn chapter_fixture(conn: &Connection) -> Chapter {
    let service = chapter_service(conn);
    let book = service.create_book("Book").unwrap();
    service.create_chapter(book.uuid, "One").unwrap()
}

#[test]
fn revert_restores_content_and_appends_a_history_entry() {
    let conn = setup();
    let chapters = chapter_service(&conn);
    let versions = version_service(&conn);
    let reverts = revert_service(&conn);
    let chapter = chapter_fixture(&conn);

    chapters.save_content(chapter.uuid, "Hello world").unwrap();
    let first = versions
        .create_version(chapter.uuid, "Hello world", None)
        .unwrap();
    chapters
        .save_content(chapter.uuid, "Hello there world")
        .unwrap();
    let second = versions
        .create_version(chapter.uuid, "Hello there world", None)
        .unwrap();

    let reverted = reverts.revert_to_version(chapter.uuid, first.uuid).unwrap();
    assert_eq!(reverted.chapter_uuid, chapter.uuid);
    assert_eq!(reverted.content, "Hello world");
    assert_eq!(reverted.word_count, 2);
    assert!(reverted.description.starts_with("Reverted to version from"));

    let live = chapters.get_chapter(chapter.uuid).unwrap().unwrap();
    assert_eq!(live.content, "Hello world");
    assert_eq!(live.word_count, 2);

    let history = versions.list_versions(chapter.uuid).unwrap();
    let uuids: Vec<_> = history.iter().map(|version| version.uuid).collect();
    assert_eq!(uuids, vec![reverted.uuid, second.uuid, first.uuid]);
}

#[test]
fn revert_description_names_the_source_snapshot_time() {
    let conn = setup();
    let chapters = chapter_service(&conn);
    let versions = version_service(&conn);
    let reverts = revert_service(&conn);
    let chapter = chapter_fixture(&conn);

    chapters.save_content(chapter.uuid, "Hello world").unwrap();
    let source = versions
        .create_version(chapter.uuid, "Hello world", None)
        .unwrap();
    conn.execute(
        "UPDATE chapter_versions SET created_at = 1700000000000 WHERE uuid = ?1;",
        [source.uuid.to_string()],
    )
    .unwrap();

    let reverted = reverts.revert_to_version(chapter.uuid, source.uuid).unwrap();
    assert_eq!(
        reverted.description,
        "Reverted to version from 2023-11-14 22:13:20 UTC"
    );
}

#[test]
fn revert_rejects_a_version_of_another_chapter_without_side_effects() {
    let conn = setup();
    let chapters = chapter_service(&conn);
    let versions = version_service(&conn);
    let reverts = revert_service(&conn);

    let book = chapters.create_book("Book").unwrap();
    let left = chapters.create_chapter(book.uuid, "Left").unwrap();
    let right = chapters.create_chapter(book.uuid, "Right").unwrap();

    chapters.save_content(left.uuid, "left text").unwrap();
    chapters.save_content(right.uuid, "right text").unwrap();
    let right_version = versions
        .create_version(right.uuid, "right text", None)
        .unwrap();

    let err = reverts
        .revert_to_version(left.uuid, right_version.uuid)
        .unwrap_err();
    assert!(matches!(
        err,
        RevertServiceError::VersionNotOwned {
            version_uuid,
            chapter_uuid,
        } if version_uuid == right_version.uuid && chapter_uuid == left.uuid
    ));

    let left_live = chapters.get_chapter(left.uuid).unwrap().unwrap();
    assert_eq!(left_live.content, "left text");
    assert!(versions.list_versions(left.uuid).unwrap().is_empty());

    let right_live = chapters.get_chapter(right.uuid).unwrap().unwrap();
    assert_eq!(right_live.content, "right text");
    assert_eq!(versions.list_versions(right.uuid).unwrap().len(), 1);
}

#[test]
fn revert_with_unknown_version_fails() {
    let conn = setup();
    let reverts = revert_service(&conn);
    let chapter = chapter_fixture(&conn);
    let unknown_version = Uuid::new_v4();

    let err = reverts
        .revert_to_version(chapter.uuid, unknown_version)
        .unwrap_err();
    assert!(matches!(
        err,
        RevertServiceError::VersionNotFound(id) if id == unknown_version
    ));
}

#[test]
fn failed_history_append_leaves_the_chapter_untouched() {
    let conn = setup();
    let chapters = chapter_service(&conn);
    let versions = version_service(&conn);
    let reverts = revert_service(&conn);
    let chapter = chapter_fixture(&conn);

    chapters.save_content(chapter.uuid, "Hello world").unwrap();
    let first = versions
        .create_version(chapter.uuid, "Hello world", None)
        .unwrap();
    chapters
        .save_content(chapter.uuid, "Hello there world")
        .unwrap();
    versions
        .create_version(chapter.uuid, "Hello there world", None)
        .unwrap();

    conn.execute_batch(
        "CREATE TRIGGER chapter_versions_fail_insert_test
         BEFORE INSERT ON chapter_versions
         BEGIN
             SELECT RAISE(ABORT, 'forced history failure');
         END;",
    )
    .unwrap();

    let revert_result = reverts.revert_to_version(chapter.uuid, first.uuid);
    assert!(revert_result.is_err());

    let live = chapters.get_chapter(chapter.uuid).unwrap().unwrap();
    assert_eq!(live.content, "Hello there world");
    assert_eq!(live.word_count, 3);
    assert_eq!(versions.list_versions(chapter.uuid).unwrap().len(), 2);
}

#[test]
fn repeated_reverts_append_separate_history_entries() {
    let conn = setup();
    let chapters = chapter_service(&conn);
    let versions = version_service(&conn);
    let reverts = revert_service(&conn);
    let chapter = chapter_fixture(&conn);

    chapters.save_content(chapter.uuid, "Hello world").unwrap();
    let first = versions
        .create_version(chapter.uuid, "Hello world", None)
        .unwrap();
    chapters
        .save_content(chapter.uuid, "Hello there world")
        .unwrap();
    versions
        .create_version(chapter.uuid, "Hello there world", None)
        .unwrap();

    let revert_one = reverts.revert_to_version(chapter.uuid, first.uuid).unwrap();
    let revert_two = reverts.revert_to_version(chapter.uuid, first.uuid).unwrap();
    assert_ne!(revert_one.uuid, revert_two.uuid);
    assert!(revert_two.seq > revert_one.seq);

    let history = versions.list_versions(chapter.uuid).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].uuid, revert_two.uuid);
    assert_eq!(history[1].uuid, revert_one.uuid);

    let live = chapters.get_chapter(chapter.uuid).unwrap().unwrap();
    assert_eq!(live.content, "Hello world");
    assert_eq!(live.word_count, 2);
}
