//! Book domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a book.
pub type BookId = Uuid;

/// Owning container for an ordered set of chapters.
///
/// Books carry no ordering state themselves; chapter positions live on the
/// chapters and stay contiguous per book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Stable global ID.
    pub uuid: BookId,
    /// User-facing title.
    pub title: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}
