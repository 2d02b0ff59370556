//! Use-case service layer.
//!
//! # Responsibility
//! - Expose book/chapter/version use-cases to core callers.
//! - Normalize caller input before it reaches repositories.
//!
//! # Invariants
//! - Services never bypass repository persistence contracts.
//! - Service layer stays storage-agnostic; SQLite details live in `repo`.

pub mod chapter_service;
pub mod revert_service;
pub mod version_service;
