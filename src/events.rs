use serde::{Deserialize, Serialize};

use crate::tree::{BookId, CaseId, RoomId, ShelfId};

/// State changes published by a [`crate::Library`] to its observers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LibraryEvent {
    /// A room was added
    RoomAdded(RoomId),
    /// A case was added to a room
    CaseAdded {
        /// The new case
        case: CaseId,
        /// Its room
        room: RoomId,
    },
    /// A shelf was added to a case
    ShelfAdded {
        /// The new shelf
        shelf: ShelfId,
        /// Its case
        case: CaseId,
    },
    /// A new book entered the library
    BookPlaced {
        /// The new book
        book: BookId,
        /// Shelf the placement was anchored at
        anchor: ShelfId,
        /// Shelf the book actually rests on
        shelf: ShelfId,
    },
    /// An existing book was pushed along to another shelf by a cascade
    BookDisplaced {
        /// The moved book
        book: BookId,
        /// Shelf it left
        from: ShelfId,
        /// Shelf it landed on
        to: ShelfId,
    },
    /// A borrower was registered
    BorrowerAdded(String),
    /// A book was lent out
    Lent {
        /// The book
        book: BookId,
        /// Who has it
        borrower: String,
    },
    /// A book came back from its borrower
    Returned(BookId),
    /// A book was taken off its shelf without being lent
    TakenOffShelf(BookId),
    /// A book was put back on its shelf
    PutOnShelf(BookId),
}
