//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Multi-row mutations (ordering shifts, revert) run inside one immediate
//!   transaction; a failure mid-flight leaves storage untouched.

pub mod chapter_repo;
pub mod version_repo;
