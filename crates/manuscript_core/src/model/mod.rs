//! Domain model for books, chapters, and chapter version history.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep integrity checks next to the data they protect.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Stored word counts are always derivable from stored content.

pub mod book;
pub mod chapter;
pub mod version;
