//! Event System
//!
//! The manager reports what happened during a frame through typed queues
//! instead of calling back into game code. Queues are cleared at the start
//! of every frame, so readers see exactly one frame's worth.

use crate::math::Vec2;
use crate::preset::ObjectKind;
use super::entity::UniqueId;
use super::moid::Moid;

/// A queue for events of a single type.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All simulation event queues.
#[derive(Debug, Default)]
pub struct Events {
    /// Object joined the manager
    pub spawned: EventQueue<SpawnedEvent>,
    /// Object removed (lifetime, bounds, explicit removal, gibbed)
    pub deleted: EventQueue<DeletedEvent>,
    /// Object baked into terrain
    pub settled: EventQueue<SettledEvent>,
    pub gibbed: EventQueue<GibbedEvent>,
    /// Part came off its parent and became a free body
    pub detached: EventQueue<DetachedEvent>,
    pub mo_hit: EventQueue<MoHitEvent>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all event queues. Called at the start of each frame.
    pub fn clear_all(&mut self) {
        self.spawned.clear();
        self.deleted.clear();
        self.settled.clear();
        self.gibbed.clear();
        self.detached.clear();
        self.mo_hit.clear();
    }

    pub fn total(&self) -> usize {
        self.spawned.len()
            + self.deleted.len()
            + self.settled.len()
            + self.gibbed.len()
            + self.detached.len()
            + self.mo_hit.len()
    }
}

// =============================================================================
// Event Types
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SpawnedEvent {
    pub unique_id: UniqueId,
    pub kind: ObjectKind,
    pub position: Vec2,
}

/// Why an object left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// Lifetime expired or flagged by game code
    Flagged,
    OutOfBounds,
    Gibbed,
    Removed,
}

#[derive(Debug, Clone, Copy)]
pub struct DeletedEvent {
    pub unique_id: UniqueId,
    pub reason: DeleteReason,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy)]
pub struct SettledEvent {
    pub unique_id: UniqueId,
    pub position: Vec2,
    /// Terrain pixels written
    pub pixels: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct GibbedEvent {
    pub unique_id: UniqueId,
    pub position: Vec2,
    /// Released parts plus spawned gibs
    pub pieces: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DetachedEvent {
    pub unique_id: UniqueId,
    /// Former parent (may already be gone)
    pub parent: UniqueId,
}

/// One object ran into another this frame.
#[derive(Debug, Clone, Copy)]
pub struct MoHitEvent {
    pub hitter: UniqueId,
    /// Root of the object that was hit
    pub target: UniqueId,
    /// Exact part hit
    pub target_moid: Moid,
    pub point: Vec2,
    pub impulse: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue() {
        let mut queue: EventQueue<i32> = EventQueue::new();

        queue.send(1);
        queue.send(2);
        queue.send(3);

        assert_eq!(queue.len(), 3);

        let collected: Vec<_> = queue.drain().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_events_container() {
        let mut events = Events::new();

        events.deleted.send(DeletedEvent {
            unique_id: UniqueId::NONE,
            reason: DeleteReason::OutOfBounds,
            position: Vec2::ZERO,
        });
        events.detached.send(DetachedEvent {
            unique_id: UniqueId::NONE,
            parent: UniqueId::NONE,
        });

        assert_eq!(events.total(), 2);

        events.clear_all();
        assert_eq!(events.total(), 0);
    }
}
