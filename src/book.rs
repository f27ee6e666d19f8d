use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{LibraryError, Result},
    tree::{Locatable, ShelfId},
};

/// A book. Width is an abstract shelf-space unit: a normal paperback is 1,
/// a heavy hardcover might be 3.
#[derive(Debug, Clone)]
pub struct Book {
    /// Title
    title: String,
    /// Author
    author: String,
    /// Page count, always positive
    pages: u32,
    /// Genre
    genre: String,
    /// Shelf space taken, always positive
    width: u32,
    /// Whether the book is physically on its shelf
    on_shelf: bool,
    /// Name of the borrower holding the book
    lent_to: Option<String>,
    /// Shelf the book occupies
    shelf: Option<ShelfId>,
}

impl Book {
    /// Create a book that has not been placed yet.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidPages`] or [`LibraryError::InvalidWidth`]
    /// when either count is zero.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        pages: u32,
        genre: impl Into<String>,
        width: u32,
    ) -> Result<Self> {
        if pages == 0 {
            return Err(LibraryError::InvalidPages);
        }
        if width == 0 {
            return Err(LibraryError::InvalidWidth);
        }
        Ok(Self {
            title: title.into(),
            author: author.into(),
            pages,
            genre: genre.into(),
            width,
            on_shelf: false,
            lent_to: None,
            shelf: None,
        })
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Author.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Page count.
    #[must_use]
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Genre.
    #[must_use]
    pub fn genre(&self) -> &str {
        &self.genre
    }

    /// Shelf space taken.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the book is physically on its shelf.
    #[must_use]
    pub fn is_on_shelf(&self) -> bool {
        self.on_shelf
    }

    /// Name of the current borrower.
    #[must_use]
    pub fn lent_to(&self) -> Option<&str> {
        self.lent_to.as_deref()
    }

    /// Text of the given field, for searching.
    #[must_use]
    pub fn field(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Genre => &self.genre,
        }
    }

    /// Mark the book as lent to `borrower`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::AlreadyLent`] if someone already holds the book;
    /// the current loan is left untouched.
    pub(crate) fn lend_to(&mut self, borrower: &str) -> Result<()> {
        if let Some(current) = &self.lent_to {
            return Err(LibraryError::AlreadyLent {
                title: self.title.clone(),
                borrower: current.clone(),
            });
        }
        self.lent_to = Some(borrower.to_string());
        self.on_shelf = false;
        Ok(())
    }

    /// Take the book back from whoever holds it and put it on its shelf.
    pub(crate) fn return_from_borrower(&mut self) {
        self.lent_to = None;
        self.on_shelf = true;
    }

    /// Set the on-shelf flag directly.
    pub(crate) fn set_on_shelf(&mut self, on_shelf: bool) {
        self.on_shelf = on_shelf;
    }

    /// Restore a loan from persisted state without the conflict check.
    pub(crate) fn set_lent_to(&mut self, borrower: Option<String>) {
        self.lent_to = borrower;
    }
}

impl Locatable for Book {
    type Parent = ShelfId;

    fn parent(&self) -> Option<ShelfId> {
        self.shelf
    }

    fn set_parent(&mut self, parent: ShelfId) {
        self.shelf = Some(parent);
    }
}

// Books are the same book when author and title match.
impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.author == other.author && self.title == other.title
    }
}

impl Eq for Book {}

impl PartialOrd for Book {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Book {
    fn cmp(&self, other: &Self) -> Ordering {
        self.author.cmp(&other.author).then_with(|| self.title.cmp(&other.title))
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Someone who can borrow books.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Borrower {
    /// Unique name within a library
    pub name: String,
}

impl Borrower {
    /// Create a borrower.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Book fields that can be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookField {
    /// Match against the title
    Title,
    /// Match against the author
    Author,
    /// Match against the genre
    Genre,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn book(title: &str, author: &str) -> Book {
        Book::new(title, author, 100, "Fiction", 1).unwrap()
    }

    #[test]
    fn test_rejects_zero_width_and_pages() {
        assert!(matches!(Book::new("T", "A", 10, "G", 0), Err(LibraryError::InvalidWidth)));
        assert!(matches!(Book::new("T", "A", 0, "G", 1), Err(LibraryError::InvalidPages)));
    }

    #[test]
    fn test_equality_uses_author_and_title() {
        let mut other = book("Dune", "Herbert");
        other.genre = "Science Fiction".to_string();
        other.width = 3;
        assert_eq!(book("Dune", "Herbert"), other);
        assert_ne!(book("Dune", "Herbert"), book("Dune Messiah", "Herbert"));
    }

    #[test]
    fn test_ordering_is_author_then_title() {
        let mut books = vec![
            book("Zebra", "Adams"),
            book("Apple", "Brown"),
            book("Middle", "Adams"),
        ];
        books.sort();
        let titles: Vec<&str> = books.iter().map(Book::title).collect();
        assert_eq!(titles, vec!["Middle", "Zebra", "Apple"]);
    }

    #[test]
    fn test_lend_twice_keeps_first_borrower() {
        let mut b = book("Dune", "Herbert");
        b.set_on_shelf(true);

        assert!(b.lend_to("Alice").is_ok());
        assert!(!b.is_on_shelf());

        let second = b.lend_to("Bob");
        assert!(second.as_ref().is_err_and(LibraryError::is_already_lent));
        assert_eq!(b.lent_to(), Some("Alice"));
    }

    #[test]
    fn test_return_puts_book_back() {
        let mut b = book("Dune", "Herbert");
        assert!(b.lend_to("Alice").is_ok());
        b.return_from_borrower();
        assert_eq!(b.lent_to(), None);
        assert!(b.is_on_shelf());
    }

    #[test]
    fn test_field_lookup() {
        let b = book("Dune", "Herbert");
        assert_eq!(b.field(BookField::Title), "Dune");
        assert_eq!(b.field(BookField::Author), "Herbert");
        assert_eq!(b.field(BookField::Genre), "Fiction");
    }
}
