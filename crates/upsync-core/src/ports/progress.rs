//! Progress reporting port (driven/secondary port)
//!
//! The engine hands every [`SyncEvent`] to an [`IProgressReporter`]. The CLI
//! prints them; tests collect them.
//!
//! ## Design Notes
//!
//! - Reporting is synchronous and infallible: losing a progress line must
//!   never fail a sync.

use std::sync::Mutex;

use crate::domain::event::SyncEvent;

/// Port trait for operator progress output
pub trait IProgressReporter: Send + Sync {
    /// Called once per event, in traversal order
    fn report(&self, event: &SyncEvent);
}

/// Reporter that keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<SyncEvent>>,
}

impl CollectingReporter {
    /// Creates an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events seen so far
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the events rendered as operator lines
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl IProgressReporter for CollectingReporter {
    fn report(&self, event: &SyncEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
