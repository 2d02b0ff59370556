//! Chapter ordering property tests.
//!
//! Drives random insert/remove/reorder sequences against a plain `Vec` model
//! and checks that stored positions always form the contiguous run `1..=N`.

use manuscript_core::db::open_db_in_memory;
use manuscript_core::{ChapterId, ChapterService, SqliteChapterRepository};
use proptest::test_runner::Config as ProptestConfig;
use proptest::{prelude::*, prop_oneof};

#[derive(Debug, Clone)]
enum Operation {
    Insert,
    Remove { index: usize },
    Reorder { index: usize, target: u32 },
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let insert = Just(Operation::Insert);
    let remove = (0usize..32usize).prop_map(|index| Operation::Remove { index });
    let reorder = (0usize..32usize, 0u32..40u32)
        .prop_map(|(index, target)| Operation::Reorder { index, target });

    prop_oneof![insert, remove, reorder]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn chapter_positions_always_form_a_contiguous_one_based_run(
        ops in proptest::collection::vec(operation_strategy(), 0..24)
    ) {
        let conn = open_db_in_memory().unwrap();
        let service = ChapterService::new(SqliteChapterRepository::try_new(&conn).unwrap());
        let book = service.create_book("Book").unwrap();

        let mut model: Vec<ChapterId> = Vec::new();
        let mut chapter_counter = 0u32;

        for op in ops {
            match op {
                Operation::Insert => {
                    chapter_counter += 1;
                    let chapter = service
                        .create_chapter(book.uuid, format!("Chapter {chapter_counter}"))
                        .unwrap();
                    model.push(chapter.uuid);
                }
                Operation::Remove { index } => {
                    if model.is_empty() {
                        continue;
                    }
                    let removed = model.remove(index % model.len());
                    service.remove_chapter(removed).unwrap();
                }
                Operation::Reorder { index, target } => {
                    if model.is_empty() {
                        continue;
                    }
                    let from = index % model.len();
                    let moving = model[from];
                    service.reorder_chapter(moving, target).unwrap();

                    let clamped = target.clamp(1, model.len() as u32);
                    model.remove(from);
                    model.insert((clamped - 1) as usize, moving);
                }
            }
        }

        let listed = service.list_chapters(book.uuid).unwrap();
        let listed_ids: Vec<ChapterId> = listed.iter().map(|chapter| chapter.uuid).collect();
        let listed_positions: Vec<u32> = listed.iter().map(|chapter| chapter.position).collect();
        let expected_positions: Vec<u32> = (1..=model.len() as u32).collect();

        prop_assert_eq!(listed_ids, model);
        prop_assert_eq!(listed_positions, expected_positions);
    }
}
