//! CLI argument definitions for the shelf-library binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use shelf_library::{BookField, LibraryError};
use thiserror::Error;

/// Home library catalog with automatic shelf allocation
#[derive(Parser, Debug)]
#[command(name = "shelf-library")]
#[command(about = "Catalog a home library and let books find their own shelf")]
#[command(version)]
pub struct Cli {
    /// Library file to read and write
    #[arg(short, long, global = true, default_value = "library.json", env = "SHELF_LIBRARY_FILE")]
    pub file: PathBuf,

    /// Log more (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// What to do
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands. Rooms, cases and shelves are chosen by their zero-based
/// index within their parent; books by their zero-based index in the whole
/// library, as listed by `show --books`.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty library file
    Init {
        /// Name of the library
        label: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Commands on the library as a whole
    #[command(flatten)]
    Library(LibraryCommand),
    /// Commands on one book
    #[command(flatten)]
    Book(BookCommand),
}

/// Commands that inspect or extend the library as a whole
#[derive(Subcommand, Debug)]
pub enum LibraryCommand {
    /// Print the layout of the library
    Show {
        /// List the books on each shelf
        #[arg(long)]
        books: bool,
    },
    /// Print summary counts
    Stats,
    /// Add a room
    AddRoom {
        /// Room name
        label: String,
        /// Insert before this index instead of at the end
        #[arg(long)]
        position: Option<usize>,
    },
    /// Add a bookcase to a room
    AddCase {
        /// Room index
        room: usize,
        /// Case name
        label: String,
        /// Insert before this index instead of at the end
        #[arg(long)]
        position: Option<usize>,
    },
    /// Add a shelf to a bookcase
    AddShelf {
        /// Room index
        room: usize,
        /// Case index within the room
        case: usize,
        /// Shelf name
        label: String,
        /// Width available for books
        width: u32,
        /// Insert before this index instead of at the end
        #[arg(long)]
        position: Option<usize>,
    },
    /// Add a book, letting it find a shelf
    AddBook(AddBookArgs),
    /// Register someone who can borrow books
    AddPerson {
        /// Borrower name
        name: String,
    },
    /// Search the catalog
    Find {
        /// Field to search
        #[arg(long, value_enum, default_value = "title")]
        by: SearchField,
        /// Text to look for, case-insensitive
        text: String,
    },
    /// Suggest a random book
    Random {
        /// Seed for a repeatable pick
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Commands that address one book by index
#[derive(Subcommand, Debug)]
pub enum BookCommand {
    /// Describe where a book is
    Where {
        /// Book index
        book: usize,
    },
    /// Print everything known about a book
    Details {
        /// Book index
        book: usize,
    },
    /// Lend a book to a registered borrower
    Lend {
        /// Book index
        book: usize,
        /// Borrower name
        name: String,
    },
    /// Take a lent book back
    Return {
        /// Book index
        book: usize,
    },
    /// Put a book back on its shelf
    Shelve {
        /// Book index
        book: usize,
    },
    /// Take a book off its shelf
    Unshelve {
        /// Book index
        book: usize,
    },
}

/// Arguments for the add-book command
#[derive(clap::Args, Debug)]
pub struct AddBookArgs {
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Page count
    pub pages: u32,
    /// Genre
    pub genre: String,
    /// Shelf space the book takes
    #[arg(short, long, default_value_t = 1)]
    pub width: u32,
    /// Room index of the target shelf
    #[arg(long, requires = "shelf")]
    pub room: Option<usize>,
    /// Case index of the target shelf
    #[arg(long, requires = "shelf")]
    pub case: Option<usize>,
    /// Target shelf index; the book is inserted there and overflow cascades
    #[arg(long, requires_all = ["room", "case"])]
    pub shelf: Option<usize>,
    /// Position on the target shelf, counted from the left
    #[arg(long)]
    pub position: Option<usize>,
}

/// Searchable book field
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SearchField {
    /// Match titles
    Title,
    /// Match authors
    Author,
    /// Match genres
    Genre,
}

impl From<SearchField> for BookField {
    fn from(field: SearchField) -> Self {
        match field {
            SearchField::Title => Self::Title,
            SearchField::Author => Self::Author,
            SearchField::Genre => Self::Genre,
        }
    }
}

/// Failures reported by the binary
#[derive(Debug, Error)]
pub enum CliError {
    /// No library file at the given path
    #[error("no library found at {0}; run `init` first")]
    NoLibrary(PathBuf),

    /// `init` would overwrite an existing file
    #[error("{0} already exists; pass --force to replace it")]
    AlreadyExists(PathBuf),

    /// An index argument is out of range
    #[error("there is no {kind} at index {index}")]
    NoSuchIndex {
        /// What was being selected
        kind: &'static str,
        /// The index given
        index: usize,
    },

    /// The library rejected the operation
    #[error(transparent)]
    Library(#[from] LibraryError),
}
