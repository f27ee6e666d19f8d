use crate::events::LibraryEvent;

/// Trait for library change observation
pub trait LibraryObserver {
    /// Called after a change has been applied
    fn on_event(&self, event: &LibraryEvent);
}

/// Logs all events through `tracing`
#[derive(Debug)]
pub struct TracingObserver;

impl LibraryObserver for TracingObserver {
    fn on_event(&self, event: &LibraryEvent) {
        match event {
            LibraryEvent::BookPlaced { book, anchor, shelf } => {
                tracing::info!(%book, %anchor, %shelf, "book placed");
            }
            LibraryEvent::BookDisplaced { book, from, to } => {
                tracing::info!(%book, %from, %to, "book displaced");
            }
            LibraryEvent::Lent { book, borrower } => {
                tracing::info!(%book, borrower = borrower.as_str(), "book lent");
            }
            LibraryEvent::Returned(book) => tracing::info!(%book, "book returned"),
            other => tracing::debug!(event = ?other, "library changed"),
        }
    }
}
