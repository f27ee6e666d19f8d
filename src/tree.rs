//! Containment tree building blocks.
//!
//! Nodes live in flat arenas owned by [`crate::Library`] and refer to each
//! other through typed ids. Ownership runs strictly from a container to its
//! children; the parent link on a child is a plain id used to rebuild the path
//! to the root.
//!
//! Two independent capabilities are composed per node type:
//!
//! | Node    | [`Container`] | [`Locatable`] |
//! |---------|---------------|---------------|
//! | Library | yes           | no            |
//! | Room    | yes           | yes           |
//! | Case    | yes           | yes           |
//! | Shelf   | yes           | yes           |
//! | Book    | no            | yes           |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines a copyable arena id with a `prefix#index` display form.
macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Wrap an arena slot.
            pub(crate) const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Slot of the node in its arena.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

node_id!(
    /// Id of a room.
    RoomId,
    "room"
);
node_id!(
    /// Id of a case.
    CaseId,
    "case"
);
node_id!(
    /// Id of a shelf.
    ShelfId,
    "shelf"
);
node_id!(
    /// Id of a book.
    BookId,
    "book"
);

/// Marker for the single root of a library, used as the parent of rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryRoot;

/// A reference to any node of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// The library itself
    Library,
    /// A room
    Room(RoomId),
    /// A case
    Case(CaseId),
    /// A shelf
    Shelf(ShelfId),
    /// A book
    Book(BookId),
}

impl From<LibraryRoot> for NodeRef {
    fn from(_: LibraryRoot) -> Self {
        Self::Library
    }
}

impl From<RoomId> for NodeRef {
    fn from(id: RoomId) -> Self {
        Self::Room(id)
    }
}

impl From<CaseId> for NodeRef {
    fn from(id: CaseId) -> Self {
        Self::Case(id)
    }
}

impl From<ShelfId> for NodeRef {
    fn from(id: ShelfId) -> Self {
        Self::Shelf(id)
    }
}

impl From<BookId> for NodeRef {
    fn from(id: BookId) -> Self {
        Self::Book(id)
    }
}

/// A node with an ordered list of children.
///
/// Read-only outside the crate; children are added through the
/// `Library::add_*` methods, which also link them back to their parent.
///
/// ```compile_fail
/// use shelf_library::{Container, Library};
///
/// let mut library = Library::new("Home");
/// let room = library.add_room("Study", None);
/// library.children_mut().push(room);
/// ```
pub trait Container {
    /// Id type of the children
    type Child: Copy + PartialEq;

    /// Children in left-to-right order.
    fn children(&self) -> &[Self::Child];

    /// Index of a child, if present.
    fn position_of(&self, child: Self::Child) -> Option<usize> {
        self.children().iter().position(|c| *c == child)
    }
}

/// Write access to a child list. Crate-private so that children only enter
/// through [`add_child`], which also sets the back-reference.
pub(crate) trait ContainerMut: Container {
    /// Mutable access to the child list.
    fn children_mut(&mut self) -> &mut Vec<Self::Child>;

    /// Insert a child id at `position`, or at the end when `position` is
    /// `None` or past the end. Returns the index the child landed at.
    fn insert_child(&mut self, child: Self::Child, position: Option<usize>) -> usize {
        let children = self.children_mut();
        let at = position.map_or(children.len(), |p| p.min(children.len()));
        children.insert(at, child);
        at
    }
}

/// A node that sits inside a container.
pub trait Locatable {
    /// Id type of the container
    type Parent: Copy + Into<NodeRef>;

    /// The immediate container, if the node is attached.
    fn parent(&self) -> Option<Self::Parent>;

    /// Point the back-reference at a new container.
    fn set_parent(&mut self, parent: Self::Parent);
}

/// Insert `child` into `container` and link it back to `container_id`.
///
/// Returns the index the child landed at; see [`ContainerMut::insert_child`].
pub(crate) fn add_child<C, L>(
    container: &mut C,
    container_id: L::Parent,
    child_id: C::Child,
    child: &mut L,
    position: Option<usize>,
) -> usize
where
    C: ContainerMut,
    L: Locatable,
{
    child.set_parent(container_id);
    container.insert_child(child_id, position)
}

/// A room holding cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Display label
    label: String,
    /// Back-reference to the library
    parent: Option<LibraryRoot>,
    /// Cases in order
    cases: Vec<CaseId>,
}

impl Room {
    /// Create a detached, empty room.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), parent: None, cases: Vec::new() }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cases in order.
    #[must_use]
    pub fn cases(&self) -> &[CaseId] {
        &self.cases
    }
}

impl Container for Room {
    type Child = CaseId;

    fn children(&self) -> &[CaseId] {
        &self.cases
    }

}

impl ContainerMut for Room {
    fn children_mut(&mut self) -> &mut Vec<CaseId> {
        &mut self.cases
    }
}

impl Locatable for Room {
    type Parent = LibraryRoot;

    fn parent(&self) -> Option<LibraryRoot> {
        self.parent
    }

    fn set_parent(&mut self, parent: LibraryRoot) {
        self.parent = Some(parent);
    }
}

/// A bookcase holding shelves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    /// Display label
    label: String,
    /// Back-reference to the room
    parent: Option<RoomId>,
    /// Shelves in top-to-bottom order
    shelves: Vec<ShelfId>,
}

impl Case {
    /// Create a detached, empty case.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), parent: None, shelves: Vec::new() }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Shelves in order.
    #[must_use]
    pub fn shelves(&self) -> &[ShelfId] {
        &self.shelves
    }
}

impl Container for Case {
    type Child = ShelfId;

    fn children(&self) -> &[ShelfId] {
        &self.shelves
    }

}

impl ContainerMut for Case {
    fn children_mut(&mut self) -> &mut Vec<ShelfId> {
        &mut self.shelves
    }
}

impl Locatable for Case {
    type Parent = RoomId;

    fn parent(&self) -> Option<RoomId> {
        self.parent
    }

    fn set_parent(&mut self, parent: RoomId) {
        self.parent = Some(parent);
    }
}

/// A shelf with a fixed capacity, measured in the same units as book width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shelf {
    /// Display label
    label: String,
    /// Total width available for books
    capacity: u32,
    /// Back-reference to the case
    parent: Option<CaseId>,
    /// Books in left-to-right order
    books: Vec<BookId>,
}

impl Shelf {
    /// Create a detached, empty shelf.
    #[must_use]
    pub fn new(label: impl Into<String>, capacity: u32) -> Self {
        Self { label: label.into(), capacity, parent: None, books: Vec::new() }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Total width available for books.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Books in left-to-right order.
    #[must_use]
    pub fn books(&self) -> &[BookId] {
        &self.books
    }

    /// Replace the whole row of books.
    pub(crate) fn set_books(&mut self, books: Vec<BookId>) {
        self.books = books;
    }
}

impl Container for Shelf {
    type Child = BookId;

    fn children(&self) -> &[BookId] {
        &self.books
    }

}

impl ContainerMut for Shelf {
    fn children_mut(&mut self) -> &mut Vec<BookId> {
        &mut self.books
    }
}

impl Locatable for Shelf {
    type Parent = CaseId;

    fn parent(&self) -> Option<CaseId> {
        self.parent
    }

    fn set_parent(&mut self, parent: CaseId) {
        self.parent = Some(parent);
    }
}
