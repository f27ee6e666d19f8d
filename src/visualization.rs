use std::fmt;

use crate::{
    book::Book,
    error::Result,
    library::Library,
    tree::NodeRef,
};

/// Text renderings of a library. Nothing here prints; callers decide where
/// the text goes.
#[derive(Debug)]
pub struct LibraryVisualization;

impl LibraryVisualization {
    /// Indented outline of the library, two spaces per level. Shelves show
    /// their free space; books are listed only when `include_books` is set.
    ///
    /// # Errors
    ///
    /// Returns an `Unknown*` error only if the library's internal links are
    /// broken.
    pub fn describe(library: &Library, include_books: bool) -> Result<String> {
        let mut out = format!("Library: {}\n", library.label());
        for room_id in library.rooms() {
            let room = library.room(*room_id)?;
            push_line(&mut out, 1, &format!("Room: {}", room.label()));
            for case_id in room.cases() {
                let case = library.case(*case_id)?;
                push_line(&mut out, 2, &format!("Case: {}", case.label()));
                for shelf_id in case.shelves() {
                    let shelf = library.shelf(*shelf_id)?;
                    push_line(
                        &mut out,
                        3,
                        &format!(
                            "Shelf: {} ({} of {} spaces available)",
                            shelf.label(),
                            library.remaining_space(*shelf_id)?,
                            shelf.capacity()
                        ),
                    );
                    if include_books {
                        for book_id in shelf.books() {
                            push_line(&mut out, 4, &Self::format_book(library.book(*book_id)?));
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Where a node is, in sentences, from the node up to the library:
    ///
    /// `"Dune" is 0 book(s) from the left on Top. Top is in Oak. Oak is in Study. Study is in Home.`
    ///
    /// # Errors
    ///
    /// Returns the matching `Unknown*` error if the node does not exist.
    pub fn narrate_location(library: &Library, node: NodeRef) -> Result<String> {
        let mut path = library.full_location(node)?;
        path.reverse();

        if let [only] = path.as_slice() {
            return Ok(format!("{}.", library.label_of(*only)?));
        }

        let mut sentences = Vec::new();
        for pair in path.windows(2) {
            let [item, container] = pair else { continue };
            let preposition = match container {
                NodeRef::Shelf(_) => "on",
                _ => "in",
            };
            let place = library.label_of(*container)?;
            let sentence = match item {
                NodeRef::Book(id) if sentences.is_empty() => format!(
                    "\"{}\" is {} book(s) from the left {preposition} {place}.",
                    library.book(*id)?.title(),
                    library.book_position(*id)?
                ),
                _ => format!("{} is {preposition} {place}.", library.label_of(*item)?),
            };
            sentences.push(sentence);
        }
        Ok(sentences.join(" "))
    }

    /// Multi-line detail block for a book.
    #[must_use]
    pub fn book_details(book: &Book) -> String {
        let mut details = format!(
            "  Title: {}\n  Author: {}\n  Pages: {}\n  Genre: {}\n  Width: {}\n  On Shelf?: {}\n",
            book.title(),
            book.author(),
            book.pages(),
            book.genre(),
            book.width(),
            book.is_on_shelf()
        );
        if let Some(borrower) = book.lent_to() {
            details.push_str(&format!("  Lent to: {borrower}\n"));
        }
        details
    }

    /// Summary counts for a library.
    ///
    /// # Errors
    ///
    /// Returns an `Unknown*` error only if the library's internal links are
    /// broken.
    pub fn stats(library: &Library) -> Result<LibraryStats> {
        let shelves = library.all_shelves_in_order();
        let books = library.all_books();

        let mut stats = LibraryStats {
            rooms: library.rooms().len(),
            shelves: shelves.len(),
            books: books.len(),
            ..LibraryStats::default()
        };
        for room in library.rooms() {
            stats.cases = stats.cases.saturating_add(library.room(*room)?.cases().len());
        }
        for shelf in &shelves {
            stats.capacity = stats.capacity.saturating_add(u64::from(library.shelf(*shelf)?.capacity()));
            stats.free = stats.free.saturating_add(u64::from(library.remaining_space(*shelf)?));
        }
        for book in &books {
            if library.book(*book)?.lent_to().is_some() {
                stats.lent = stats.lent.saturating_add(1);
            }
        }
        Ok(stats)
    }

    /// One-line form of a book for outlines.
    fn format_book(book: &Book) -> String {
        match book.lent_to() {
            Some(borrower) => format!("{} by {} (lent to {borrower})", book.title(), book.author()),
            None if !book.is_on_shelf() => format!("{} by {} (off shelf)", book.title(), book.author()),
            None => format!("{} by {}", book.title(), book.author()),
        }
    }
}

/// Append an indented line.
fn push_line(out: &mut String, depth: usize, text: &str) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(text);
    out.push('\n');
}

/// Summary counts produced by [`LibraryVisualization::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    /// Number of rooms
    pub rooms: usize,
    /// Number of cases
    pub cases: usize,
    /// Number of shelves
    pub shelves: usize,
    /// Number of books
    pub books: usize,
    /// Books currently lent out
    pub lent: usize,
    /// Total shelf capacity
    pub capacity: u64,
    /// Total free shelf space
    pub free: u64,
}

impl fmt::Display for LibraryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rooms: {}", self.rooms)?;
        writeln!(f, "Cases: {}", self.cases)?;
        writeln!(f, "Shelves: {}", self.shelves)?;
        writeln!(f, "Books: {} ({} lent)", self.books, self.lent)?;
        write!(f, "Free space: {} of {}", self.free, self.capacity)
    }
}
