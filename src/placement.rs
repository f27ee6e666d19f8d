//! Shelf allocation planning.
//!
//! Placement is decided on a snapshot of the shelves in canonical order and
//! only then applied to the library, so a placement that runs out of shelves
//! leaves nothing half-moved.
//!
//! On each shelf of a cascade the pending batch is inserted at the insertion
//! point (the requested position on the first shelf, the front afterwards) and
//! books are popped off the right end until the row fits the capacity again.
//! The popped books, still in left-to-right order, become the batch for the
//! next shelf. The cascade ends on the first shelf that absorbs the whole
//! batch.

use crate::tree::{BookId, ShelfId};

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// The new book
    pub book: BookId,
    /// Shelf the placement was anchored at. The book may have been carried
    /// further along; its parent link names the shelf it rests on.
    pub anchor: ShelfId,
}

/// A shelf as seen by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShelfRow {
    /// The shelf
    pub shelf: ShelfId,
    /// Total width available
    pub capacity: u32,
    /// Books left to right with their widths
    pub books: Vec<(BookId, u32)>,
}

impl ShelfRow {
    /// Width not yet taken by books.
    fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(total_width(self.books.iter().map(|(_, width)| *width)))
    }
}

/// One slot of a planned shelf row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// The book being placed
    Incoming,
    /// A book already in the library
    Shelved(BookId),
}

/// The new contents of one shelf touched by a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowPlan {
    /// The shelf
    pub shelf: ShelfId,
    /// Its complete row after the placement, left to right
    pub slots: Vec<Slot>,
}

/// Every shelf change needed to place one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CascadePlan {
    /// First shelf of the cascade
    pub anchor: ShelfId,
    /// Shelves in the order the cascade visits them
    pub rows: Vec<RowPlan>,
}

/// Sum widths without overflowing.
fn total_width(widths: impl IntoIterator<Item = u32>) -> u32 {
    widths.into_iter().fold(0, u32::saturating_add)
}

/// Index of the first shelf that can take `width` without moving anything.
pub(crate) fn fast_path(rows: &[ShelfRow], width: u32) -> Option<usize> {
    rows.iter().position(|row| row.remaining() >= width)
}

/// Plan a cascade starting at `rows[0]`, inserting a book of `width` at
/// `position` there. Returns `None` if books are still pending after the last
/// row.
pub(crate) fn plan_cascade(rows: &[ShelfRow], width: u32, position: usize) -> Option<CascadePlan> {
    let anchor = rows.first()?.shelf;
    let mut pending = vec![(Slot::Incoming, width)];
    let mut insert_at = position;
    let mut planned = Vec::new();

    for row in rows {
        let mut slots: Vec<(Slot, u32)> =
            row.books.iter().map(|(book, width)| (Slot::Shelved(*book), *width)).collect();
        let at = insert_at.min(slots.len());
        slots.splice(at..at, pending.drain(..));

        let mut used = total_width(slots.iter().map(|(_, width)| *width));
        while used > row.capacity {
            let Some(popped) = slots.pop() else { break };
            used = used.saturating_sub(popped.1);
            pending.push(popped);
        }
        pending.reverse();

        tracing::debug!(shelf = %row.shelf, kept = slots.len(), carried = pending.len(), "cascade step");
        planned.push(RowPlan { shelf: row.shelf, slots: slots.into_iter().map(|(slot, _)| slot).collect() });

        if pending.is_empty() {
            return Some(CascadePlan { anchor, rows: planned });
        }
        insert_at = 0;
    }
    None
}
