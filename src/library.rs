use std::{collections::BTreeMap, fmt};

use rand::{Rng, seq::IndexedRandom};

use crate::{
    book::{Book, BookField, Borrower},
    error::{LibraryError, Result},
    events::LibraryEvent,
    observers::LibraryObserver,
    placement::{self, Placement, ShelfRow, Slot},
    tree::{
        BookId, Case, CaseId, Container, ContainerMut, LibraryRoot, Locatable, NodeRef, Room,
        RoomId, Shelf, ShelfId, add_child,
    },
};

/// A home library: the root of the containment tree and the borrower registry.
///
/// Rooms, cases, shelves and books are stored in arenas and addressed by id.
/// Nodes are never removed, so ids stay valid for the life of the library.
pub struct Library {
    /// Display label
    label: String,
    /// Rooms in order
    rooms: Vec<RoomId>,
    /// Registered borrowers keyed by name
    borrowers: BTreeMap<String, Borrower>,
    /// Room arena
    room_nodes: Vec<Room>,
    /// Case arena
    case_nodes: Vec<Case>,
    /// Shelf arena
    shelf_nodes: Vec<Shelf>,
    /// Book arena
    book_nodes: Vec<Book>,
    /// Registered change observers
    observers: Vec<Box<dyn LibraryObserver>>,
}

// Manual implementation of Debug for Library
impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("label", &self.label)
            .field("rooms", &self.rooms)
            .field("borrowers", &self.borrowers)
            .field("room_nodes", &self.room_nodes)
            .field("case_nodes", &self.case_nodes)
            .field("shelf_nodes", &self.shelf_nodes)
            .field("book_nodes", &self.book_nodes)
            .field("observers_count", &self.observers.len())
            .finish()
    }
}

impl Container for Library {
    type Child = RoomId;

    fn children(&self) -> &[RoomId] {
        &self.rooms
    }

}

impl ContainerMut for Library {
    fn children_mut(&mut self) -> &mut Vec<RoomId> {
        &mut self.rooms
    }
}

impl Library {
    /// Create an empty library.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rooms: Vec::new(),
            borrowers: BTreeMap::new(),
            room_nodes: Vec::new(),
            case_nodes: Vec::new(),
            shelf_nodes: Vec::new(),
            book_nodes: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register an observer to be notified of changes
    pub fn register_observer(&mut self, observer: Box<dyn LibraryObserver>) {
        self.observers.push(observer);
    }

    /// Publish an event to every observer.
    fn notify(&self, event: &LibraryEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    /// Add a room at `position` (default: last).
    pub fn add_room(&mut self, label: impl Into<String>, position: Option<usize>) -> RoomId {
        let id = RoomId::new(self.room_nodes.len());
        let mut room = Room::new(label);
        add_child(self, LibraryRoot, id, &mut room, position);
        self.room_nodes.push(room);
        self.notify(&LibraryEvent::RoomAdded(id));
        id
    }

    /// Add a case to `room` at `position` (default: last).
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownRoom`] if the room does not exist.
    pub fn add_case(
        &mut self,
        room: RoomId,
        label: impl Into<String>,
        position: Option<usize>,
    ) -> Result<CaseId> {
        let id = CaseId::new(self.case_nodes.len());
        let mut case = Case::new(label);
        let container = self.room_nodes.get_mut(room.index()).ok_or(LibraryError::UnknownRoom(room))?;
        add_child(container, room, id, &mut case, position);
        self.case_nodes.push(case);
        self.notify(&LibraryEvent::CaseAdded { case: id, room });
        Ok(id)
    }

    /// Add a shelf of the given capacity to `case` at `position` (default: last).
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidWidth`] for a zero capacity and
    /// [`LibraryError::UnknownCase`] if the case does not exist.
    pub fn add_shelf(
        &mut self,
        case: CaseId,
        label: impl Into<String>,
        capacity: u32,
        position: Option<usize>,
    ) -> Result<ShelfId> {
        if capacity == 0 {
            return Err(LibraryError::InvalidWidth);
        }
        let id = ShelfId::new(self.shelf_nodes.len());
        let mut shelf = Shelf::new(label, capacity);
        let container = self.case_nodes.get_mut(case.index()).ok_or(LibraryError::UnknownCase(case))?;
        add_child(container, case, id, &mut shelf, position);
        self.shelf_nodes.push(shelf);
        self.notify(&LibraryEvent::ShelfAdded { shelf: id, case });
        Ok(id)
    }

    /// Rooms in order.
    #[must_use]
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }

    /// Look up a room.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownRoom`] if the id is not in this library.
    pub fn room(&self, id: RoomId) -> Result<&Room> {
        self.room_nodes.get(id.index()).ok_or(LibraryError::UnknownRoom(id))
    }

    /// Look up a case.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownCase`] if the id is not in this library.
    pub fn case(&self, id: CaseId) -> Result<&Case> {
        self.case_nodes.get(id.index()).ok_or(LibraryError::UnknownCase(id))
    }

    /// Look up a shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownShelf`] if the id is not in this library.
    pub fn shelf(&self, id: ShelfId) -> Result<&Shelf> {
        self.shelf_nodes.get(id.index()).ok_or(LibraryError::UnknownShelf(id))
    }

    /// Look up a book.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownBook`] if the id is not in this library.
    pub fn book(&self, id: BookId) -> Result<&Book> {
        self.book_nodes.get(id.index()).ok_or(LibraryError::UnknownBook(id))
    }

    /// Mutable book lookup.
    fn book_mut(&mut self, id: BookId) -> Result<&mut Book> {
        self.book_nodes.get_mut(id.index()).ok_or(LibraryError::UnknownBook(id))
    }

    /// Label of any node.
    ///
    /// # Errors
    ///
    /// Returns the matching `Unknown*` error if the node does not exist.
    pub fn label_of(&self, node: NodeRef) -> Result<&str> {
        Ok(match node {
            NodeRef::Library => &self.label,
            NodeRef::Room(id) => self.room(id)?.label(),
            NodeRef::Case(id) => self.case(id)?.label(),
            NodeRef::Shelf(id) => self.shelf(id)?.label(),
            NodeRef::Book(id) => self.book(id)?.title(),
        })
    }

    /// Shelves below `node` in canonical order: rooms, then cases, then
    /// shelves, each in insertion order.
    fn shelves_below(&self, node: NodeRef) -> Result<Vec<ShelfId>> {
        let mut shelves = Vec::new();
        match node {
            NodeRef::Library => {
                for room in &self.rooms {
                    shelves.extend(self.shelves_below(NodeRef::Room(*room))?);
                }
            }
            NodeRef::Room(id) => {
                for case in self.room(id)?.cases() {
                    shelves.extend_from_slice(self.case(*case)?.shelves());
                }
            }
            NodeRef::Case(id) => shelves.extend_from_slice(self.case(id)?.shelves()),
            NodeRef::Shelf(id) => {
                self.shelf(id)?;
                shelves.push(id);
            }
            NodeRef::Book(id) => {
                self.book(id)?;
            }
        }
        Ok(shelves)
    }

    /// Every shelf in canonical order.
    ///
    /// Ids only enter the tree through the `add_*` methods, so every link
    /// resolves.
    ///
    /// # Panics
    ///
    /// In debug builds, if the tree holds an id that does not resolve.
    #[must_use]
    pub fn all_shelves_in_order(&self) -> Vec<ShelfId> {
        let shelves = self.shelves_below(NodeRef::Library);
        debug_assert!(shelves.is_ok(), "dangling id in library tree: {shelves:?}");
        shelves.unwrap_or_default()
    }

    /// Whether the library has at least one shelf.
    #[must_use]
    pub fn has_shelves(&self) -> bool {
        !self.shelf_nodes.is_empty()
    }

    /// All books below `node`, depth first. A book has no descendants.
    ///
    /// # Errors
    ///
    /// Returns the matching `Unknown*` error if the node does not exist.
    pub fn leaf_nodes(&self, node: NodeRef) -> Result<Vec<BookId>> {
        let mut books = Vec::new();
        for shelf in self.shelves_below(node)? {
            books.extend_from_slice(self.shelf(shelf)?.books());
        }
        Ok(books)
    }

    /// Every book in canonical shelf order, left to right on each shelf.
    ///
    /// # Panics
    ///
    /// In debug builds, if the tree holds an id that does not resolve.
    #[must_use]
    pub fn all_books(&self) -> Vec<BookId> {
        let books = self.leaf_nodes(NodeRef::Library);
        debug_assert!(books.is_ok(), "dangling id in library tree: {books:?}");
        books.unwrap_or_default()
    }

    /// Books on one shelf, left to right.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownShelf`] if the shelf does not exist.
    pub fn books_on(&self, shelf: ShelfId) -> Result<&[BookId]> {
        Ok(self.shelf(shelf)?.books())
    }

    /// Combined width of the books on a shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownShelf`] if the shelf does not exist.
    pub fn used_width(&self, shelf: ShelfId) -> Result<u32> {
        let mut used = 0_u32;
        for book in self.books_on(shelf)? {
            used = used.saturating_add(self.book(*book)?.width());
        }
        Ok(used)
    }

    /// Width still free on a shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownShelf`] if the shelf does not exist.
    pub fn remaining_space(&self, shelf: ShelfId) -> Result<u32> {
        Ok(self.shelf(shelf)?.capacity().saturating_sub(self.used_width(shelf)?))
    }

    /// Zero-based position of a book counted from the left of its shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownBook`] if the book does not exist or is
    /// not on any shelf.
    pub fn book_position(&self, book: BookId) -> Result<usize> {
        let shelf = self.book(book)?.parent().ok_or(LibraryError::UnknownBook(book))?;
        self.shelf(shelf)?.position_of(book).ok_or(LibraryError::UnknownBook(book))
    }

    /// Path from the library down to `node`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns the matching `Unknown*` error if the node or one of its
    /// ancestors does not exist.
    pub fn full_location(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        /// Parent of a locatable node as a [`NodeRef`].
        fn parent_of<L: Locatable>(node: &L) -> Option<NodeRef> {
            node.parent().map(Into::into)
        }

        let mut path = vec![node];
        let mut current = node;
        loop {
            let parent = match current {
                NodeRef::Library => None,
                NodeRef::Room(id) => parent_of(self.room(id)?),
                NodeRef::Case(id) => parent_of(self.case(id)?),
                NodeRef::Shelf(id) => parent_of(self.shelf(id)?),
                NodeRef::Book(id) => parent_of(self.book(id)?),
            };
            match parent {
                Some(parent) => {
                    path.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        path.reverse();
        Ok(path)
    }

    /// Snapshot of a shelf for the placement planner.
    fn shelf_row(&self, id: ShelfId) -> Result<ShelfRow> {
        let shelf = self.shelf(id)?;
        let books = shelf
            .books()
            .iter()
            .map(|book| -> Result<(BookId, u32)> { Ok((*book, self.book(*book)?.width())) })
            .collect::<Result<Vec<_>>>()?;
        Ok(ShelfRow { shelf: id, capacity: shelf.capacity(), books })
    }

    /// Add a new book to the library.
    ///
    /// Without a `target`, the first shelf in canonical order with enough free
    /// space takes the book directly. Failing that, or with an explicit
    /// `target`, the book is inserted at `position` (default: the front) and
    /// overflowing books cascade onto the following shelves.
    ///
    /// The returned [`Placement`] names the shelf the placement was anchored
    /// at; the shelf the book finally rests on is its parent link.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::NoSpace`] when the cascade runs out of shelves,
    /// in which case nothing is changed, [`LibraryError::UnknownShelf`] for
    /// a target that does not exist, and [`LibraryError::UnknownBorrower`] for
    /// a book already lent to someone outside the registry.
    pub fn place(
        &mut self,
        book: Book,
        target: Option<ShelfId>,
        position: Option<usize>,
    ) -> Result<Placement> {
        let width = book.width();
        if let Some(borrower) = book.lent_to().filter(|name| !self.borrowers.contains_key(*name)) {
            return Err(LibraryError::UnknownBorrower(borrower.to_string()));
        }
        let rows = self
            .all_shelves_in_order()
            .into_iter()
            .map(|shelf| self.shelf_row(shelf))
            .collect::<Result<Vec<_>>>()?;

        let start = match target {
            Some(shelf) => rows
                .iter()
                .position(|row| row.shelf == shelf)
                .ok_or(LibraryError::UnknownShelf(shelf))?,
            None => placement::fast_path(&rows, width).unwrap_or(0),
        };

        let plan = rows
            .get(start..)
            .and_then(|rows| placement::plan_cascade(rows, width, position.unwrap_or(0)));
        let Some(plan) = plan else {
            tracing::warn!(title = book.title(), width, "no space remains in the library");
            return Err(LibraryError::NoSpace { width });
        };

        let id = BookId::new(self.book_nodes.len());
        let mut book = book;
        let on_shelf = book.lent_to().is_none();
        book.set_on_shelf(on_shelf);
        self.book_nodes.push(book);

        let mut events = Vec::new();
        for row in plan.rows {
            let books: Vec<BookId> = row
                .slots
                .iter()
                .map(|slot| match slot {
                    Slot::Incoming => id,
                    Slot::Shelved(existing) => *existing,
                })
                .collect();
            for moved in &books {
                let entry = self.book_mut(*moved)?;
                let from = entry.parent();
                entry.set_parent(row.shelf);
                if *moved == id {
                    events.push(LibraryEvent::BookPlaced {
                        book: id,
                        anchor: plan.anchor,
                        shelf: row.shelf,
                    });
                } else if let Some(from) = from.filter(|from| *from != row.shelf) {
                    events.push(LibraryEvent::BookDisplaced { book: *moved, from, to: row.shelf });
                }
            }
            self.shelf_nodes
                .get_mut(row.shelf.index())
                .ok_or(LibraryError::UnknownShelf(row.shelf))?
                .set_books(books);
        }

        for event in &events {
            self.notify(event);
        }
        Ok(Placement { book: id, anchor: plan.anchor })
    }

    /// Append a book to a shelf as-is, without capacity checks. Used when
    /// rebuilding a saved library.
    pub(crate) fn attach_book(&mut self, shelf: ShelfId, mut book: Book) -> Result<BookId> {
        let id = BookId::new(self.book_nodes.len());
        let container = self.shelf_nodes.get_mut(shelf.index()).ok_or(LibraryError::UnknownShelf(shelf))?;
        add_child(container, shelf, id, &mut book, None);
        self.book_nodes.push(book);
        Ok(id)
    }

    /// Register a borrower. Returns `false` if the name was already known.
    pub fn add_borrower(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.borrowers.contains_key(&name) {
            return false;
        }
        self.borrowers.insert(name.clone(), Borrower::new(name.clone()));
        self.notify(&LibraryEvent::BorrowerAdded(name));
        true
    }

    /// Look up a borrower by name.
    #[must_use]
    pub fn borrower(&self, name: &str) -> Option<&Borrower> {
        self.borrowers.get(name)
    }

    /// Registered borrowers sorted by name.
    pub fn borrowers(&self) -> impl Iterator<Item = &Borrower> {
        self.borrowers.values()
    }

    /// Lend a book to a registered borrower.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownBook`], [`LibraryError::UnknownBorrower`]
    /// or [`LibraryError::AlreadyLent`]; in every case the book is unchanged.
    pub fn lend(&mut self, book: BookId, borrower: &str) -> Result<()> {
        self.book(book)?;
        if !self.borrowers.contains_key(borrower) {
            return Err(LibraryError::UnknownBorrower(borrower.to_string()));
        }
        self.book_mut(book)?.lend_to(borrower)?;
        self.notify(&LibraryEvent::Lent { book, borrower: borrower.to_string() });
        Ok(())
    }

    /// Take a book back and put it on its shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownBook`] if the book does not exist.
    pub fn return_book(&mut self, book: BookId) -> Result<()> {
        self.book_mut(book)?.return_from_borrower();
        self.notify(&LibraryEvent::Returned(book));
        Ok(())
    }

    /// Take a book off its shelf without lending it.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownBook`], or [`LibraryError::AlreadyLent`]
    /// if the book is out with a borrower.
    pub fn take_off_shelf(&mut self, book: BookId) -> Result<()> {
        self.set_on_shelf(book, false)?;
        self.notify(&LibraryEvent::TakenOffShelf(book));
        Ok(())
    }

    /// Put a book that was taken off back on its shelf.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::UnknownBook`], or [`LibraryError::AlreadyLent`]
    /// if the book is out with a borrower.
    pub fn put_on_shelf(&mut self, book: BookId) -> Result<()> {
        self.set_on_shelf(book, true)?;
        self.notify(&LibraryEvent::PutOnShelf(book));
        Ok(())
    }

    /// Flip the on-shelf flag of a book that is not lent.
    fn set_on_shelf(&mut self, book: BookId, on_shelf: bool) -> Result<()> {
        let entry = self.book_mut(book)?;
        if let Some(borrower) = entry.lent_to() {
            return Err(LibraryError::AlreadyLent {
                title: entry.title().to_string(),
                borrower: borrower.to_string(),
            });
        }
        entry.set_on_shelf(on_shelf);
        Ok(())
    }

    /// Books whose `field` contains `text`, ignoring case, in canonical order.
    #[must_use]
    pub fn find_books(&self, field: BookField, text: &str) -> Vec<BookId> {
        let needle = text.to_lowercase();
        self.all_books()
            .into_iter()
            .filter(|id| {
                self.book(*id)
                    .is_ok_and(|book| book.field(field).to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Pick a book uniformly at random, or `None` for an empty library.
    pub fn random_book<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<BookId> {
        self.all_books().choose(rng).copied()
    }
}

// Include tests module
#[cfg(test)]
mod tests;
