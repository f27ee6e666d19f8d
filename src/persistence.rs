//! JSON persistence for a library.
//!
//! The document is a tree of records tagged by `type`. Parent links are not
//! stored; they are rebuilt from the nesting on load. A lent book stores only
//! its borrower's name, which is resolved against the library's borrower list
//! once that list has been read.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    book::{Book, Borrower},
    error::{LibraryError, Result},
    library::Library,
    tree::{CaseId, RoomId, ShelfId},
};

/// One node of the persisted tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    /// The root
    Library {
        /// Display label
        label: String,
        /// Registered borrowers
        #[serde(default)]
        borrowers: Vec<Borrower>,
        /// Room records
        #[serde(default)]
        children: Vec<Record>,
    },
    /// A room
    Room {
        /// Display label
        label: String,
        /// Case records
        #[serde(default)]
        children: Vec<Record>,
    },
    /// A case
    Case {
        /// Display label
        label: String,
        /// Shelf records
        #[serde(default)]
        children: Vec<Record>,
    },
    /// A shelf
    Shelf {
        /// Display label
        label: String,
        /// Capacity
        width: u32,
        /// Book records
        #[serde(default)]
        children: Vec<Record>,
    },
    /// A book
    Book {
        /// Title
        title: String,
        /// Author
        author: String,
        /// Page count
        pages: u32,
        /// Genre
        genre: String,
        /// Shelf space taken
        width: u32,
        /// Whether the book is on its shelf
        is_on_shelf: bool,
        /// Borrower, by name only
        #[serde(default)]
        lent_to: Option<Borrower>,
    },
}

impl Record {
    /// The `type` tag of this record.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Library { .. } => "Library",
            Self::Room { .. } => "Room",
            Self::Case { .. } => "Case",
            Self::Shelf { .. } => "Shelf",
            Self::Book { .. } => "Book",
        }
    }
}

/// Error for a record found where another kind was expected.
fn unexpected(expected: &str, found: &Record) -> LibraryError {
    LibraryError::Decode(format!("expected a {expected} record, found a {}", found.kind()))
}

impl Library {
    /// Convert the library into its record tree.
    ///
    /// # Errors
    ///
    /// Returns an `Unknown*` error only if the library's internal links are
    /// broken.
    pub fn to_record(&self) -> Result<Record> {
        let mut rooms = Vec::new();
        for room_id in self.rooms() {
            let room = self.room(*room_id)?;
            let mut cases = Vec::new();
            for case_id in room.cases() {
                let case = self.case(*case_id)?;
                let mut shelves = Vec::new();
                for shelf_id in case.shelves() {
                    let shelf = self.shelf(*shelf_id)?;
                    let mut books = Vec::new();
                    for book_id in shelf.books() {
                        let book = self.book(*book_id)?;
                        books.push(Record::Book {
                            title: book.title().to_string(),
                            author: book.author().to_string(),
                            pages: book.pages(),
                            genre: book.genre().to_string(),
                            width: book.width(),
                            is_on_shelf: book.is_on_shelf(),
                            lent_to: book.lent_to().map(Borrower::new),
                        });
                    }
                    shelves.push(Record::Shelf {
                        label: shelf.label().to_string(),
                        width: shelf.capacity(),
                        children: books,
                    });
                }
                cases.push(Record::Case { label: case.label().to_string(), children: shelves });
            }
            rooms.push(Record::Room { label: room.label().to_string(), children: cases });
        }

        Ok(Record::Library {
            label: self.label().to_string(),
            borrowers: self.borrowers().cloned().collect(),
            children: rooms,
        })
    }

    /// Rebuild a library from its record tree.
    ///
    /// The borrower list is registered before any book is read. A book lent
    /// to a name missing from that list loads with no borrower.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Decode`] when the root is not a library or a
    /// record sits under the wrong kind of parent, and
    /// [`LibraryError::InvalidWidth`] or [`LibraryError::InvalidPages`] for
    /// zero widths, capacities or page counts.
    pub fn from_record(record: Record) -> Result<Self> {
        let Record::Library { label, borrowers, children } = record else {
            return Err(unexpected("Library", &record));
        };

        let mut library = Self::new(label);
        for borrower in borrowers {
            library.add_borrower(borrower.name);
        }
        for child in children {
            let Record::Room { label, children } = child else {
                return Err(unexpected("Room", &child));
            };
            let room = library.add_room(label, None);
            load_cases(&mut library, room, children)?;
        }
        Ok(library)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record()?)?)
    }

    /// Parse a library from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Json`] for malformed JSON, unknown `type` tags
    /// or missing fields, plus the errors of [`Library::from_record`].
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_record(serde_json::from_str(json)?)
    }

    /// Save the library to a JSON file, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), books = self.all_books().len(), "library saved");
        Ok(())
    }

    /// Load a library from a JSON file. A missing file means there is no
    /// library yet and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] if the file exists but cannot be read, and
    /// the errors of [`Library::from_json`] if its content is not a library.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no library file found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let library = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), books = library.all_books().len(), "library loaded");
        Ok(Some(library))
    }
}

/// Rebuild the cases of a room.
fn load_cases(library: &mut Library, room: RoomId, records: Vec<Record>) -> Result<()> {
    for record in records {
        let Record::Case { label, children } = record else {
            return Err(unexpected("Case", &record));
        };
        let case = library.add_case(room, label, None)?;
        load_shelves(library, case, children)?;
    }
    Ok(())
}

/// Rebuild the shelves of a case.
fn load_shelves(library: &mut Library, case: CaseId, records: Vec<Record>) -> Result<()> {
    for record in records {
        let Record::Shelf { label, width, children } = record else {
            return Err(unexpected("Shelf", &record));
        };
        let shelf = library.add_shelf(case, label, width, None)?;
        load_books(library, shelf, children)?;
        if library.used_width(shelf)? > width {
            tracing::warn!(%shelf, capacity = width, "loaded shelf holds more than its capacity");
        }
    }
    Ok(())
}

/// Rebuild the books of a shelf, resolving borrowers by name.
fn load_books(library: &mut Library, shelf: ShelfId, records: Vec<Record>) -> Result<()> {
    for record in records {
        let Record::Book { title, author, pages, genre, width, is_on_shelf, lent_to } = record
        else {
            return Err(unexpected("Book", &record));
        };
        let mut book = Book::new(title, author, pages, genre, width)?;
        book.set_on_shelf(is_on_shelf);

        let borrower = lent_to.and_then(|borrower| {
            if library.borrower(&borrower.name).is_some() {
                Some(borrower.name)
            } else {
                tracing::warn!(
                    title = book.title(),
                    borrower = borrower.name.as_str(),
                    "borrower not registered, loading book as not lent"
                );
                None
            }
        });
        book.set_lent_to(borrower);
        library.attach_book(shelf, book)?;
    }
    Ok(())
}
