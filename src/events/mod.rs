//! # Events Module
//!
//! Progress reporting for the triage pipeline, GUI- and orchestrator-ready.
//!
//! Events are emitted on a crossbeam channel so a host application can drive
//! progress bars or logs from another thread. Emission is optional: with a
//! dropped receiver (or [`null_sender`]) events are discarded and the
//! pipeline proceeds without blocking.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// All events emitted by the triage pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Pipeline-level events
    Pipeline(PipelineEvent),
    /// Per-image scoring phase events
    Scoring(ScoringEvent),
    /// Grouping phase events
    Grouping(GroupingEvent),
    /// Best-shot selection phase events
    Selection(SelectionEvent),
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started { total_images: usize },
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed
    Completed {
        total_images: usize,
        total_groups: usize,
    },
}

/// Phases of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scoring,
    Grouping,
    Selection,
}

/// Events during the parallel per-image scoring phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScoringEvent {
    /// An image was hashed and scored
    ImageScored {
        image_id: String,
        completed: usize,
        total: usize,
    },
    /// An image was scored with substituted neutral values
    ImageDegraded { image_id: String, reason: String },
    /// Scoring completed; the record set is full
    Completed { total_scored: usize },
}

/// Events during the sequential grouping phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupingEvent {
    /// Grouping completed
    Completed {
        total_groups: usize,
        grouped_images: usize,
    },
}

/// Events during the parallel best-shot selection phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// A canonical image was chosen for a group
    BestChosen { group_id: String, image_id: String },
    /// Selection completed for all groups
    Completed { total_groups: usize },
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scoring => write!(f, "Scoring"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
            PipelinePhase::Selection => write!(f, "Selection"),
        }
    }
}

/// Sends events from the engine. Cloneable and thread-safe.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event, discarding it if no receiver is listening.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives pipeline events on the host side.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, or `None` once all senders are dropped.
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Receive without blocking.
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate events until all senders are dropped.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (EventSender, EventReceiver) {
    let (sender, receiver) = unbounded();
    (EventSender { inner: sender }, EventReceiver { inner: receiver })
}

/// A sender with no receiver, for event-free runs.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = channel();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn events_cross_threads() {
        let (sender, receiver) = channel();

        let handle = thread::spawn(move || {
            sender.send(Event::Scoring(ScoringEvent::ImageScored {
                image_id: "img_001".to_string(),
                completed: 1,
                total: 4,
            }));
        });
        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Scoring(ScoringEvent::ImageScored { completed, .. }) => {
                assert_eq!(completed, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn null_sender_discards_silently() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started { total_images: 9 }));
    }

    #[test]
    fn events_are_serializable() {
        let event = Event::Selection(SelectionEvent::BestChosen {
            group_id: "group_0".to_string(),
            image_id: "img_002".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::Selection(SelectionEvent::BestChosen { group_id, .. }) => {
                assert_eq!(group_id, "group_0");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn phase_display_order() {
        assert_eq!(PipelinePhase::Scoring.to_string(), "Scoring");
        assert_eq!(PipelinePhase::Grouping.to_string(), "Grouping");
        assert_eq!(PipelinePhase::Selection.to_string(), "Selection");
    }
}
