//! Home library catalog with automatic shelf allocation.
//!
//! A library is a tree of rooms, cases, shelves and books. Books take shelf
//! width; placing a book where it does not fit pushes the rightmost books of
//! each shelf onto the front of the next one, in canonical shelf order, until
//! everything fits or the library runs out of shelves. The whole tree persists
//! to a JSON document.

pub mod book;
pub mod error;
pub mod events;
pub mod library;
pub mod observers;
pub mod persistence;
pub mod placement;
pub mod tree;
pub mod visualization;

pub use book::{Book, BookField, Borrower};
pub use error::{LibraryError, Result};
pub use events::LibraryEvent;
pub use library::Library;
pub use observers::{LibraryObserver, TracingObserver};
pub use persistence::Record;
pub use placement::Placement;
pub use tree::{BookId, CaseId, Container, Locatable, NodeRef, RoomId, ShelfId};
pub use visualization::{LibraryStats, LibraryVisualization};
