//! Level lifecycle events
//! Key principles:
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Queuing support (immediate + deferred delivery)
//! - Handlers are borrowed at dispatch time, so the queue never owns them

use crate::world::WorldContext;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelEventType {
    /// A level started loading
    LoadingStart,
    /// A level finished loading
    LoadingComplete,
}

/// Level lifecycle event
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEvent {
    /// Type of event
    pub event_type: LevelEventType,
    /// Level the event refers to
    pub level_name: String,
    /// Timestamp when event was created (seconds)
    pub timestamp: f64,
}

impl LevelEvent {
    /// Create a new event
    pub fn new(event_type: LevelEventType, level_name: impl Into<String>, timestamp: f64) -> Self {
        Self {
            event_type,
            level_name: level_name.into(),
            timestamp,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
pub trait LevelEventHandler {
    /// Handle an event, return true if consumed
    fn on_level_event(&mut self, event: &LevelEvent, world: &mut WorldContext<'_>) -> bool;
}

/// Queue of level events awaiting dispatch
#[derive(Debug, Default)]
pub struct LevelEventQueue {
    immediate_queue: Vec<LevelEvent>,
    deferred_queue: Vec<(f64, LevelEvent)>,
    current_time: f64,
}

impl LevelEventQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Send event for handling on the next dispatch
    pub fn send(&mut self, event: LevelEvent) {
        self.immediate_queue.push(event);
    }

    /// Post event for deferred delivery at specified time
    pub fn post(&mut self, delivery_time: f64, event: LevelEvent) {
        self.deferred_queue.push((delivery_time, event));
    }

    /// Number of events not yet dispatched
    pub fn pending(&self) -> usize {
        self.immediate_queue.len() + self.deferred_queue.len()
    }

    /// Dispatch all pending events.
    /// Processes immediate queue first, then due deferred events in posting order.
    /// Returns the number of events delivered.
    pub fn dispatch(
        &mut self,
        handlers: &mut [&mut dyn LevelEventHandler],
        world: &mut WorldContext<'_>,
    ) -> usize {
        let mut due = std::mem::take(&mut self.immediate_queue);

        let current_time = self.current_time;
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred_queue)
            .into_iter()
            .partition(|(time, _)| *time <= current_time);
        self.deferred_queue = waiting;
        due.extend(ready.into_iter().map(|(_, event)| event));

        for event in &due {
            log::debug!("Dispatching {:?} for level '{}'", event.event_type, event.level_name);
            for handler in handlers.iter_mut() {
                if handler.on_level_event(event, world) {
                    // Event consumed, stop forwarding
                    break;
                }
            }
        }
        due.len()
    }

    /// Clear all queued events
    pub fn clear(&mut self) {
        self.immediate_queue.clear();
        self.deferred_queue.clear();
    }
}
