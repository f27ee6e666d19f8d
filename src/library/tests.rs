use std::{cell::RefCell, rc::Rc};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    book::{Book, BookField},
    error::LibraryError,
    events::LibraryEvent,
    library::Library,
    observers::LibraryObserver,
    tree::{Container, LibraryRoot, Locatable, NodeRef, ShelfId},
};

/// Observer that keeps every event it sees
#[derive(Debug, Default, Clone)]
struct RecordingObserver {
    /// Shared event log
    events: Rc<RefCell<Vec<LibraryEvent>>>,
}

impl LibraryObserver for RecordingObserver {
    fn on_event(&self, event: &LibraryEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Helper function to build a book of a given width
#[allow(clippy::unwrap_used)]
fn book(title: &str, width: u32) -> Book {
    Book::new(title, "Author", 100, "Fiction", width).unwrap()
}

/// Helper function to set up one room, one case and shelves of the given widths
#[allow(clippy::unwrap_used)]
fn setup_library(capacities: &[u32]) -> (Library, Vec<ShelfId>) {
    let mut library = Library::new("Home");
    let room = library.add_room("Study", None);
    let case = library.add_case(room, "Oak", None).unwrap();
    let shelves = capacities
        .iter()
        .enumerate()
        .map(|(i, capacity)| library.add_shelf(case, format!("Shelf {i}"), *capacity, None).unwrap())
        .collect();
    (library, shelves)
}

/// Append books to the right end of a shelf
#[allow(clippy::unwrap_used)]
fn shelve_all(library: &mut Library, shelf: ShelfId, books: &[(&str, u32)]) {
    for (title, width) in books {
        library.place(book(title, *width), Some(shelf), Some(usize::MAX)).unwrap();
    }
}

/// Titles on a shelf, left to right
#[allow(clippy::unwrap_used)]
fn titles(library: &Library, shelf: ShelfId) -> Vec<String> {
    library
        .books_on(shelf)
        .unwrap()
        .iter()
        .map(|id| library.book(*id).unwrap().title().to_string())
        .collect()
}

#[test]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
fn test_overflow_displaces_last_book_to_next_shelf() {
    let (mut library, shelves) = setup_library(&[5, 5]);
    shelve_all(&mut library, shelves[0], &[("A", 2), ("B", 2)]);
    shelve_all(&mut library, shelves[1], &[("C", 3)]);
    assert_eq!(library.remaining_space(shelves[0]).unwrap(), 1);

    let placement = library.place(book("New", 2), Some(shelves[0]), None).unwrap();

    assert_eq!(placement.anchor, shelves[0]);
    assert_eq!(titles(&library, shelves[0]), vec!["New", "A"]);
    assert_eq!(titles(&library, shelves[1]), vec!["B", "C"]);
    let moved = *library.books_on(shelves[1]).unwrap().first().unwrap();
    assert_eq!(library.book(moved).unwrap().parent(), Some(shelves[1]));
    assert_eq!(library.all_books().len(), 4);
}

#[test]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
fn test_no_space_leaves_library_unchanged() {
    let (mut library, shelves) = setup_library(&[4, 4]);
    shelve_all(&mut library, shelves[0], &[("A", 2), ("B", 2)]);
    shelve_all(&mut library, shelves[1], &[("C", 3)]);
    let before = library.to_record().unwrap();

    let result = library.place(book("New", 2), None, None);

    assert!(result.as_ref().is_err_and(LibraryError::is_no_space));
    assert_eq!(library.to_record().unwrap(), before);
    assert_eq!(library.all_books().len(), 3);
}

#[test]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
fn test_fast_path_beats_earlier_cascade() {
    let (mut library, shelves) = setup_library(&[3, 3, 3]);
    library.place(book("A", 2), Some(shelves[0]), None).unwrap();
    library.place(book("B", 3), Some(shelves[1]), None).unwrap();

    let placement = library.place(book("New", 2), None, None).unwrap();

    assert_eq!(placement.anchor, shelves[2]);
    assert_eq!(titles(&library, shelves[0]), vec!["A"]);
    assert_eq!(titles(&library, shelves[1]), vec!["B"]);
    assert_eq!(titles(&library, shelves[2]), vec!["New"]);
}

#[test]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
fn test_without_fast_path_cascade_starts_at_first_shelf() {
    let (mut library, shelves) = setup_library(&[4, 3, 1]);
    shelve_all(&mut library, shelves[0], &[("A", 1), ("B", 1), ("C", 1), ("D", 1)]);
    shelve_all(&mut library, shelves[1], &[("E", 1)]);

    // No single shelf has 3 free, but the books behind it can move along.
    let placement = library.place(book("New", 3), None, None).unwrap();

    assert_eq!(placement.anchor, shelves[0]);
    assert_eq!(titles(&library, shelves[0]), vec!["New", "A"]);
    assert_eq!(titles(&library, shelves[1]), vec!["B", "C", "D"]);
    assert_eq!(titles(&library, shelves[2]), vec!["E"]);
    assert_eq!(library.all_books().len(), 6);
}

#[test]
fn test_place_into_empty_library_fails() {
    let mut library = Library::new("Home");
    let result = library.place(book("A", 1), None, None);
    assert!(matches!(result, Err(LibraryError::NoSpace { width: 1 })));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_unknown_target_shelf() {
    let (mut library, _) = setup_library(&[3]);
    let result = library.place(book("A", 1), Some(ShelfId::new(9)), None);
    assert!(matches!(result, Err(LibraryError::UnknownShelf(_))));
    assert!(library.all_books().is_empty());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_placements_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut library, shelves) = setup_library(&[6, 4, 7, 5, 3]);

    for i in 0..60 {
        let before = library.all_books();
        let width = rng.random_range(1..=3);
        let target = if rng.random_bool(0.5) {
            shelves.get(rng.random_range(0..shelves.len())).copied()
        } else {
            None
        };
        let position = rng.random_bool(0.5).then(|| rng.random_range(0..4));

        match library.place(book(&format!("Book {i}"), width), target, position) {
            Ok(placement) => {
                let after = library.all_books();
                assert_eq!(after.len(), before.len().saturating_add(1));
                let survivors: Vec<_> =
                    after.iter().copied().filter(|id| *id != placement.book).collect();
                assert_eq!(survivors, before, "relative order changed");
            }
            Err(e) => {
                assert!(e.is_no_space());
                assert_eq!(library.all_books(), before);
            }
        }

        for shelf in &shelves {
            let used = library.used_width(*shelf).unwrap();
            assert!(used <= library.shelf(*shelf).unwrap().capacity());
        }
    }
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_lend_conflict_keeps_first_borrower() {
    let (mut library, _) = setup_library(&[5]);
    library.add_borrower("Alice");
    library.add_borrower("Bob");
    let id = library.place(book("Dune", 1), None, None).unwrap().book;

    assert!(library.lend(id, "Alice").is_ok());
    let second = library.lend(id, "Bob");

    assert!(second.as_ref().is_err_and(LibraryError::is_already_lent));
    assert_eq!(library.book(id).unwrap().lent_to(), Some("Alice"));
    assert!(!library.book(id).unwrap().is_on_shelf());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_lend_to_unknown_borrower() {
    let (mut library, _) = setup_library(&[5]);
    let id = library.place(book("Dune", 1), None, None).unwrap().book;

    let result = library.lend(id, "Carol");

    assert!(matches!(result, Err(LibraryError::UnknownBorrower(ref name)) if name == "Carol"));
    assert_eq!(library.book(id).unwrap().lent_to(), None);
    assert!(library.book(id).unwrap().is_on_shelf());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_and_shelf_toggle() {
    let (mut library, _) = setup_library(&[5]);
    library.add_borrower("Alice");
    let id = library.place(book("Dune", 1), None, None).unwrap().book;

    library.lend(id, "Alice").unwrap();
    assert!(matches!(library.take_off_shelf(id), Err(LibraryError::AlreadyLent { .. })));

    library.return_book(id).unwrap();
    assert_eq!(library.book(id).unwrap().lent_to(), None);
    assert!(library.book(id).unwrap().is_on_shelf());

    library.take_off_shelf(id).unwrap();
    assert!(!library.book(id).unwrap().is_on_shelf());
    library.put_on_shelf(id).unwrap();
    assert!(library.book(id).unwrap().is_on_shelf());
}

#[test]
fn test_borrower_registry_is_add_if_absent() {
    let mut library = Library::new("Home");
    assert!(library.add_borrower("Alice"));
    assert!(!library.add_borrower("Alice"));
    assert!(library.add_borrower("Bob"));
    let names: Vec<&str> = library.borrowers().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_full_location_and_leaf_nodes() {
    let mut library = Library::new("Home");
    let study = library.add_room("Study", None);
    let hall = library.add_room("Hall", Some(0));
    assert_eq!(library.rooms(), &[hall, study]);

    let case = library.add_case(study, "Oak", None).unwrap();
    let top = library.add_shelf(case, "Top", 3, None).unwrap();
    let id = library.place(book("Dune", 1), None, None).unwrap().book;

    assert_eq!(library.full_location(NodeRef::Library).unwrap(), vec![NodeRef::Library]);
    assert_eq!(
        library.full_location(NodeRef::Book(id)).unwrap(),
        vec![
            NodeRef::Library,
            NodeRef::Room(study),
            NodeRef::Case(case),
            NodeRef::Shelf(top),
            NodeRef::Book(id),
        ]
    );
    assert_eq!(library.leaf_nodes(NodeRef::Room(study)).unwrap(), vec![id]);
    assert!(library.leaf_nodes(NodeRef::Room(hall)).unwrap().is_empty());
    assert!(library.leaf_nodes(NodeRef::Book(id)).unwrap().is_empty());
    assert_eq!(library.book_position(id).unwrap(), 0);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_canonical_shelf_order_follows_tree() {
    let mut library = Library::new("Home");
    let first = library.add_room("First", None);
    let second = library.add_room("Second", None);
    let b = library.add_case(second, "B", None).unwrap();
    let a = library.add_case(first, "A", None).unwrap();
    let b1 = library.add_shelf(b, "b1", 1, None).unwrap();
    let a2 = library.add_shelf(a, "a2", 1, None).unwrap();
    let a1 = library.add_shelf(a, "a1", 1, Some(0)).unwrap();

    assert_eq!(library.all_shelves_in_order(), vec![a1, a2, b1]);
    assert!(library.has_shelves());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_find_books_ignores_case() {
    let (mut library, _) = setup_library(&[10]);
    let dune = library.place(Book::new("Dune", "Frank Herbert", 412, "SF", 1).unwrap(), None, None).unwrap().book;
    library.place(Book::new("Emma", "Jane Austen", 474, "Classic", 1).unwrap(), None, None).unwrap();

    assert_eq!(library.find_books(BookField::Author, "HERBERT"), vec![dune]);
    assert_eq!(library.find_books(BookField::Title, "m").len(), 1);
    assert_eq!(library.find_books(BookField::Genre, "").len(), 2);
    assert!(library.find_books(BookField::Title, "Ulysses").is_empty());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_random_book_uses_supplied_rng() {
    let (mut library, _) = setup_library(&[10]);
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(library.random_book(&mut rng), None);

    library.place(book("A", 1), None, None).unwrap();
    library.place(book("B", 1), None, None).unwrap();

    let picked = library.random_book(&mut rng).unwrap();
    assert!(library.all_books().contains(&picked));
    let again = library.random_book(&mut StdRng::seed_from_u64(1));
    let again_too = library.random_book(&mut StdRng::seed_from_u64(1));
    assert_eq!(again, again_too);
}

#[test]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
fn test_observers_see_placement_and_displacement() {
    let (mut library, shelves) = setup_library(&[2, 2]);
    let observer = RecordingObserver::default();
    library.register_observer(Box::new(observer.clone()));

    let first = library.place(book("A", 2), Some(shelves[0]), None).unwrap().book;
    let second = library.place(book("B", 2), Some(shelves[0]), None).unwrap().book;

    let events = observer.events.borrow();
    assert_eq!(
        *events,
        vec![
            LibraryEvent::BookPlaced { book: first, anchor: shelves[0], shelf: shelves[0] },
            LibraryEvent::BookPlaced { book: second, anchor: shelves[0], shelf: shelves[0] },
            LibraryEvent::BookDisplaced { book: first, from: shelves[0], to: shelves[1] },
        ]
    );
}

#[test]
fn test_zero_capacity_shelf_rejected() {
    let mut library = Library::new("Home");
    let room = library.add_room("Study", None);
    let case = library.add_case(room, "Oak", None);
    assert!(case.is_ok());
    if let Ok(case) = case {
        assert!(matches!(library.add_shelf(case, "Top", 0, None), Err(LibraryError::InvalidWidth)));
    }
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_place_rejects_book_lent_to_unregistered_borrower() {
    let (mut library, _) = setup_library(&[5]);
    let mut lent = book("Dune", 1);
    lent.lend_to("Zed").unwrap();

    let result = library.place(lent, None, None);

    assert!(matches!(result, Err(LibraryError::UnknownBorrower(ref name)) if name == "Zed"));
    assert!(library.all_books().is_empty());
    assert!(library.borrower("Zed").is_none());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_placed_loan_survives_round_trip() {
    let (mut library, _) = setup_library(&[5]);
    library.add_borrower("Alice");
    let mut lent = book("Dune", 1);
    lent.lend_to("Alice").unwrap();

    let id = library.place(lent, None, None).unwrap().book;
    assert!(!library.book(id).unwrap().is_on_shelf());

    let loaded = Library::from_json(&library.to_json().unwrap()).unwrap();
    assert_eq!(loaded.to_record().unwrap(), library.to_record().unwrap());
    let loaded_id = loaded.all_books().first().copied().unwrap();
    assert_eq!(loaded.book(loaded_id).unwrap().lent_to(), Some("Alice"));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_rooms_enter_only_through_add_room() {
    let mut library = Library::new("Home");
    let study = library.add_room("Study", None);
    let hall = library.add_room("Hall", Some(0));
    let case = library.add_case(study, "Oak", None).unwrap();
    let top = library.add_shelf(case, "Top", 3, None).unwrap();
    library.place(book("Dune", 1), None, None).unwrap();

    assert_eq!(library.children(), &[hall, study]);
    assert_eq!(library.position_of(study), Some(1));
    assert_eq!(library.room(study).unwrap().parent(), Some(LibraryRoot));
    assert_eq!(library.all_shelves_in_order(), vec![top]);
    assert_eq!(library.all_books().len(), 1);
}
