//! Cooperative cancellation for long-running searches.
//!
//! A [`ProgressSource`] hands out tickets stamped with its current
//! generation. Tickets from one source stay live side by side; calling
//! [`ProgressSource::cancel`] bumps the generation, which makes every
//! outstanding [`ProgressTicket`] report itself as cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Marker error returned when a ticket has been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Issues cancellation tickets.
#[derive(Debug, Clone, Default)]
pub struct ProgressSource {
    generation: Arc<AtomicU64>,
}

impl ProgressSource {
    /// Creates a new source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new request. Earlier tickets are left running.
    #[must_use]
    pub fn begin(&self) -> ProgressTicket {
        let ticket = self.generation.load(Ordering::Relaxed);
        ProgressTicket {
            generation: Some(Arc::clone(&self.generation)),
            ticket,
        }
    }

    /// Cancels every outstanding ticket.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }
}

/// A cancellation token passed down to every search call.
#[derive(Debug, Clone)]
pub struct ProgressTicket {
    generation: Option<Arc<AtomicU64>>,
    ticket: u64,
}

impl ProgressTicket {
    /// A ticket that is never cancelled.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            generation: None,
            ticket: 0,
        }
    }

    /// Returns true if the source was cancelled after this ticket began.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.generation
            .as_ref()
            .is_some_and(|generation| generation.load(Ordering::Relaxed) != self.ticket)
    }

    /// Returns `Err(Cancelled)` if this ticket has been cancelled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for ProgressTicket {
    fn default() -> Self {
        Self::detached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_from_one_source_run_side_by_side() {
        let source = ProgressSource::new();
        let first = source.begin();
        let second = source.clone().begin();
        assert!(!first.is_cancelled());
        assert!(!second.is_cancelled());

        source.cancel();
        assert_eq!(first.check(), Err(Cancelled));
        assert_eq!(second.check(), Err(Cancelled));
        assert!(!source.begin().is_cancelled());
    }

    #[test]
    fn cancel_invalidates_active_ticket() {
        let source = ProgressSource::new();
        let ticket = source.begin();
        source.cancel();
        assert!(ticket.is_cancelled());
    }

    #[test]
    fn detached_ticket_never_cancels() {
        assert!(ProgressTicket::detached().check().is_ok());
    }
}
