//! Session types

use serde::{Deserialize, Serialize};

/// A scheduled session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier assigned by the store's allocator
    pub id: u64,
    /// Free-text title
    pub title: String,
    /// Free-text date, stored and echoed verbatim
    pub date: String,
}

impl Session {
    /// Create a session with an already allocated id
    pub fn new(id: u64, title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            date: date.into(),
        }
    }
}
