//! Command-line front end for a shelf-library catalog file.

use std::{path::Path, process::ExitCode};

use clap::Parser;
use colored::Colorize;
use rand::{SeedableRng, rngs::StdRng};
use shelf_library::{
    Book, BookId, CaseId, Library, LibraryVisualization, NodeRef, RoomId, ShelfId,
    TracingObserver,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{AddBookArgs, BookCommand, Cli, CliError, Commands, LibraryCommand};

/// Whether a command changed the library and needs saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Read-only command
    Unchanged,
    /// The library must be written back
    Modified,
}

/// Parse arguments, run one command and map the result to an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Install the log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shelf_library={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Dispatch a parsed command line.
fn run(cli: Cli) -> Result<(), CliError> {
    let (library, outcome) = match cli.command {
        Commands::Init { label, force } => return init(&cli.file, &label, force),
        Commands::Library(command) => {
            let mut library = open(&cli.file)?;
            let outcome = execute(&mut library, command)?;
            (library, outcome)
        }
        Commands::Book(command) => {
            let mut library = open(&cli.file)?;
            let outcome = execute_on_book(&mut library, command)?;
            (library, outcome)
        }
    };

    if outcome == Outcome::Modified {
        library.save(&cli.file)?;
    }
    Ok(())
}

/// Load an existing library and attach the log observer.
fn open(path: &Path) -> Result<Library, CliError> {
    let mut library = Library::load(path)?.ok_or_else(|| CliError::NoLibrary(path.to_path_buf()))?;
    library.register_observer(Box::new(TracingObserver));
    Ok(library)
}

/// Create a fresh library file.
fn init(path: &Path, label: &str, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    Library::new(label).save(path)?;
    println!("{} {} at {}", "Created library".green().bold(), label, path.display());
    Ok(())
}

/// Commands on the library as a whole.
fn execute(library: &mut Library, command: LibraryCommand) -> Result<Outcome, CliError> {
    match command {
        LibraryCommand::Show { books } => {
            print!("{}", LibraryVisualization::describe(library, books)?);
            Ok(Outcome::Unchanged)
        }
        LibraryCommand::Stats => {
            println!("{}", LibraryVisualization::stats(library)?);
            Ok(Outcome::Unchanged)
        }
        LibraryCommand::AddRoom { label, position } => {
            library.add_room(label.as_str(), position);
            println!("{} {label}", "Added room".green());
            Ok(Outcome::Modified)
        }
        LibraryCommand::AddCase { room, label, position } => {
            let room = room_at(library, room)?;
            library.add_case(room, label.as_str(), position)?;
            println!("{} {label}", "Added case".green());
            Ok(Outcome::Modified)
        }
        LibraryCommand::AddShelf { room, case, label, width, position } => {
            let case = case_at(library, room_at(library, room)?, case)?;
            library.add_shelf(case, label.as_str(), width, position)?;
            println!("{} {label} ({width} spaces)", "Added shelf".green());
            Ok(Outcome::Modified)
        }
        LibraryCommand::AddBook(args) => add_book(library, args),
        LibraryCommand::AddPerson { name } => {
            if library.add_borrower(name.as_str()) {
                println!("{} {name}", "Added borrower".green());
                Ok(Outcome::Modified)
            } else {
                println!("{} {name} is already registered", "Note:".yellow());
                Ok(Outcome::Unchanged)
            }
        }
        LibraryCommand::Find { by, text } => {
            let all = library.all_books();
            let found = library.find_books(by.into(), &text);
            if found.is_empty() {
                println!("{}", "No matching books".yellow());
            }
            for id in found {
                let index = all.iter().position(|book| *book == id).unwrap_or_default();
                let book = library.book(id)?;
                println!("[{index}] {} by {}", book.title().bold(), book.author());
            }
            Ok(Outcome::Unchanged)
        }
        LibraryCommand::Random { seed } => {
            let pick = match seed {
                Some(seed) => library.random_book(&mut StdRng::seed_from_u64(seed)),
                None => library.random_book(&mut rand::rng()),
            };
            match pick {
                Some(id) => print!("{}", LibraryVisualization::book_details(library.book(id)?)),
                None => println!("{}", "The library has no books yet".yellow()),
            }
            Ok(Outcome::Unchanged)
        }
    }
}

/// Commands that address a single book by index.
fn execute_on_book(library: &mut Library, command: BookCommand) -> Result<Outcome, CliError> {
    match command {
        BookCommand::Where { book } => {
            let id = book_at(library, book)?;
            println!("{}", LibraryVisualization::narrate_location(library, NodeRef::Book(id))?);
            Ok(Outcome::Unchanged)
        }
        BookCommand::Details { book } => {
            let id = book_at(library, book)?;
            print!("{}", LibraryVisualization::book_details(library.book(id)?));
            Ok(Outcome::Unchanged)
        }
        BookCommand::Lend { book, name } => {
            let id = book_at(library, book)?;
            library.lend(id, &name)?;
            println!("{} \"{}\" to {name}", "Lent".green(), library.book(id)?.title());
            Ok(Outcome::Modified)
        }
        BookCommand::Return { book } => {
            let id = book_at(library, book)?;
            library.return_book(id)?;
            println!("{} \"{}\"", "Returned".green(), library.book(id)?.title());
            Ok(Outcome::Modified)
        }
        BookCommand::Shelve { book } => {
            let id = book_at(library, book)?;
            library.put_on_shelf(id)?;
            println!("{} \"{}\"", "Shelved".green(), library.book(id)?.title());
            Ok(Outcome::Modified)
        }
        BookCommand::Unshelve { book } => {
            let id = book_at(library, book)?;
            library.take_off_shelf(id)?;
            println!("{} \"{}\"", "Took off shelf".green(), library.book(id)?.title());
            Ok(Outcome::Modified)
        }
    }
}

/// Place a new book and report where it ended up.
fn add_book(library: &mut Library, args: AddBookArgs) -> Result<Outcome, CliError> {
    let target = match (args.room, args.case, args.shelf) {
        (Some(room), Some(case), Some(shelf)) => {
            let case = case_at(library, room_at(library, room)?, case)?;
            Some(shelf_at(library, case, shelf)?)
        }
        _ => None,
    };
    let book = Book::new(args.title, args.author, args.pages, args.genre, args.width)?;

    let placement = library.place(book, target, args.position)?;
    let anchor = library.shelf(placement.anchor)?.label();
    println!("{} (placement started at {anchor})", "Added book".green().bold());
    println!("{}", LibraryVisualization::narrate_location(library, NodeRef::Book(placement.book))?);
    Ok(Outcome::Modified)
}

/// Room at a top-level index.
fn room_at(library: &Library, index: usize) -> Result<RoomId, CliError> {
    library.rooms().get(index).copied().ok_or(CliError::NoSuchIndex { kind: "room", index })
}

/// Case at an index within a room.
fn case_at(library: &Library, room: RoomId, index: usize) -> Result<CaseId, CliError> {
    library.room(room)?.cases().get(index).copied().ok_or(CliError::NoSuchIndex { kind: "case", index })
}

/// Shelf at an index within a case.
fn shelf_at(library: &Library, case: CaseId, index: usize) -> Result<ShelfId, CliError> {
    library.case(case)?.shelves().get(index).copied().ok_or(CliError::NoSuchIndex { kind: "shelf", index })
}

/// Book at an index in canonical order.
fn book_at(library: &Library, index: usize) -> Result<BookId, CliError> {
    library.all_books().get(index).copied().ok_or(CliError::NoSuchIndex { kind: "book", index })
}
