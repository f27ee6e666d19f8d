//! Error types for library operations.
//!
//! Capacity failures, lending conflicts and lookup misses are ordinary values
//! the caller inspects; none of them leave the library in a partially mutated
//! state. Only I/O and malformed JSON come from outside the model.

use thiserror::Error;

use crate::tree::{BookId, CaseId, RoomId, ShelfId};

/// Errors produced by the library model, the placement engine and persistence.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// No room with this id exists in the library.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// No case with this id exists in the library.
    #[error("unknown case: {0}")]
    UnknownCase(CaseId),

    /// No shelf with this id exists in the library.
    #[error("unknown shelf: {0}")]
    UnknownShelf(ShelfId),

    /// No book with this id exists in the library.
    #[error("unknown book: {0}")]
    UnknownBook(BookId),

    /// The cascade ran past the last shelf with books still pending.
    #[error("no space remains in the library for a book of width {width}")]
    NoSpace {
        /// Width of the book that could not be placed
        width: u32,
    },

    /// The book is already lent out.
    #[error("\"{title}\" is already lent to {borrower}")]
    AlreadyLent {
        /// Title of the book
        title: String,
        /// Current borrower
        borrower: String,
    },

    /// The borrower is not registered with the library.
    #[error("unknown borrower: {0}")]
    UnknownBorrower(String),

    /// Widths and capacities must be positive.
    #[error("width must be a positive integer")]
    InvalidWidth,

    /// Page counts must be positive.
    #[error("pages must be a positive integer")]
    InvalidPages,

    /// The persisted document is well-formed JSON but not a valid library.
    #[error("invalid library document: {0}")]
    Decode(String),

    /// Reading or writing the library file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The library file is not valid JSON for the record format.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LibraryError {
    /// Check whether this is a capacity failure.
    #[must_use]
    pub fn is_no_space(&self) -> bool {
        matches!(self, Self::NoSpace { .. })
    }

    /// Check whether this is a lending conflict.
    #[must_use]
    pub fn is_already_lent(&self) -> bool {
        matches!(self, Self::AlreadyLent { .. })
    }

    /// Check whether this is a failed id or name lookup.
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::UnknownRoom(_)
                | Self::UnknownCase(_)
                | Self::UnknownShelf(_)
                | Self::UnknownBook(_)
                | Self::UnknownBorrower(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LibraryError>;
