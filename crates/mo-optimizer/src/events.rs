//! Progress events emitted while an optimization runs.

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mo_types::Category;

use crate::prefilter::PlanKind;
use crate::run::StrategyKind;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The catalog was narrowed to the requested category.
    CatalogFiltered {
        category: Category,
        catalog_size: usize,
        filtered_size: usize,
    },
    /// Too few modules survived filtering to form a combination.
    InsufficientModules { category: Category, available: usize },
    /// Strategies were chosen for the filtered catalog.
    Prefiltered {
        plan: PlanKind,
        enumeration_size: usize,
        pool_size: usize,
    },
    /// A strategy finished.
    StrategyFinished {
        strategy: StrategyKind,
        solutions: usize,
        elapsed_ms: u64,
    },
    /// The accelerated backend failed and enumeration reran on the CPU.
    BackendFallback { backend: String, reason: String },
    /// The run finished with this many solutions.
    Completed { solutions: usize },
}

/// A single event, stamped with the run it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerEvent {
    pub id: Uuid,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl OptimizerEvent {
    pub fn new(run_id: Uuid, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Optional outbound channel for events. Sends never block; a full or
/// disconnected channel drops the event.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<Sender<OptimizerEvent>>,
}

impl EventSink {
    pub fn new(tx: Sender<OptimizerEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.is_some()
    }

    pub fn emit(&self, run_id: Uuid, kind: EventKind) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(OptimizerEvent::new(run_id, kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};

    #[test]
    fn detached_sink_is_silent() {
        let sink = EventSink::default();
        assert!(!sink.is_attached());
        sink.emit(Uuid::new_v4(), EventKind::Completed { solutions: 1 });
    }

    #[test]
    fn events_carry_run_id() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let run_id = Uuid::new_v4();
        sink.emit(run_id, EventKind::Completed { solutions: 3 });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.run_id, run_id);
        assert_eq!(event.kind, EventKind::Completed { solutions: 3 });
        assert_ne!(event.id, run_id);
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (tx, rx) = bounded(1);
        let sink = EventSink::new(tx);
        let run_id = Uuid::new_v4();
        sink.emit(run_id, EventKind::Completed { solutions: 1 });
        sink.emit(run_id, EventKind::Completed { solutions: 2 });
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn event_serializes() {
        let event = OptimizerEvent::new(
            Uuid::new_v4(),
            EventKind::InsufficientModules {
                category: Category::Guardian,
                available: 3,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: OptimizerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
