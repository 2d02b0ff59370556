//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `manuscript_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use manuscript_core::db::migrations::latest_version;
use manuscript_core::db::{open_db, open_db_in_memory};

fn main() {
    println!("manuscript_core version={}", manuscript_core::core_version());
    println!("manuscript_core schema_version={}", latest_version());
    println!(
        "manuscript_core word_count_probe={}",
        manuscript_core::count_words("counted words here")
    );

    // A path argument selects file-backed open; the default stays in memory.
    let probe = match std::env::args().nth(1) {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    };
    match probe {
        Ok(_conn) => println!("manuscript_core db_probe=ok"),
        Err(err) => {
            eprintln!("manuscript_core db_probe=failed error={err}");
            std::process::exit(1);
        }
    }
}
