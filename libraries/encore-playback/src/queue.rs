//! Playback queue engine
//!
//! Owns the ordered list of queued items and the cursor into it. Every
//! mutation keeps `position < len` for a non-empty queue and `position == 0`
//! for an empty one. Out-of-range input is ignored, never an error.
//!
//! The engine never touches the widget. When a mutation changes the current
//! track it asks the [`TransportPort`] to (re)load it.

use crate::ports::{QueuePort, TransportPort};
use crate::shuffle::shuffle_pinned;
use crate::types::{QueueItem, RepeatMode, TransitionReason};
use rand::Rng;
use tracing::debug;

/// Default "restart instead of going back" window in seconds
pub const DEFAULT_RESTART_THRESHOLD_SECS: f64 = 5.0;

/// Ordered playback queue with a cursor
#[derive(Debug, Clone)]
pub struct QueueEngine {
    items: Vec<QueueItem>,

    /// Index of the current item (0 when empty)
    position: usize,

    /// Raised when the queue emptied under the current track
    stop_requested: bool,

    /// Raised while persisted state is being restored
    initializing: bool,

    /// Seconds past `start_at` after which "previous" restarts the track
    restart_threshold: f64,
}

impl QueueEngine {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::with_restart_threshold(DEFAULT_RESTART_THRESHOLD_SECS)
    }

    pub fn with_restart_threshold(restart_threshold: f64) -> Self {
        Self {
            items: Vec::new(),
            position: 0,
            stop_requested: false,
            initializing: false,
            restart_threshold,
        }
    }

    // ===== Queries =====

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor into the queue (meaningless when empty)
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current item
    pub fn now_playing(&self) -> Option<&QueueItem> {
        self.items.get(self.position)
    }

    pub fn has_next(&self) -> bool {
        self.position + 1 < self.items.len()
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0 && !self.items.is_empty()
    }

    /// Whether the next item is the same song from the same video
    pub fn is_next_same_song(&self) -> bool {
        match (self.now_playing(), self.items.get(self.position + 1)) {
            (Some(current), Some(next)) => current.is_same_song(next),
            _ => false,
        }
    }

    /// Whether the previous item is the same song from the same video
    pub fn is_previous_same_song(&self) -> bool {
        if self.position == 0 {
            return false;
        }
        match (self.now_playing(), self.items.get(self.position - 1)) {
            (Some(current), Some(previous)) => current.is_same_song(previous),
            _ => false,
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Consume the stop request raised by `remove_at`/`clear`
    pub fn take_stop_request(&mut self) -> bool {
        std::mem::take(&mut self.stop_requested)
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    // ===== Restore =====

    /// Enter the restore phase (suppresses the empty-queue cue)
    pub fn begin_restore(&mut self) {
        self.initializing = true;
    }

    pub fn finish_restore(&mut self) {
        self.initializing = false;
    }

    /// Install restored contents
    ///
    /// An out-of-range `position` falls back to 0.
    pub fn restore(&mut self, items: Vec<QueueItem>, position: Option<usize>) {
        self.items = items;
        self.position = position.filter(|&p| p < self.items.len()).unwrap_or(0);
    }

    // ===== Mutation =====

    /// Replace the queue wholesale and reset the cursor
    pub fn set_queue(&mut self, items: Vec<QueueItem>) {
        debug!(len = items.len(), "Replacing queue");
        self.items = items;
        self.position = 0;
    }

    /// Append an item, or insert it right after the current one
    ///
    /// Adding to an empty queue cues the new item without playing it,
    /// unless a restore is in progress.
    pub fn enqueue(
        &mut self,
        item: QueueItem,
        to_front: bool,
        transport: &mut dyn TransportPort,
    ) -> bool {
        let was_empty = self.items.is_empty();

        debug!(
            track_id = item.track.id,
            to_front,
            len = self.items.len(),
            initializing = self.initializing,
            "Adding to queue"
        );

        if to_front {
            let at = (self.position + 1).min(self.items.len());
            self.items.insert(at, item);
        } else {
            self.items.push(item);
        }

        if was_empty && !self.initializing {
            debug!("Queue was empty, cueing first track");
            transport.cue(&self.items[0]);
        }

        true
    }

    /// Remove the item at `index`
    ///
    /// Removing the current item restarts playback on whatever takes its
    /// place, or raises the stop request when the queue empties.
    pub fn remove_at(&mut self, index: usize, transport: &mut dyn TransportPort) -> bool {
        if index >= self.items.len() {
            return false;
        }

        self.items.remove(index);

        if index == self.position {
            if self.items.is_empty() {
                debug!("Queue became empty, requesting stop");
                self.position = 0;
                self.stop_requested = true;
            } else {
                if self.position >= self.items.len() {
                    self.position = self.items.len() - 1;
                }
                transport.set_transition_reason(TransitionReason::Manual);
                transport.load_and_play(&self.items[self.position]);
            }
        } else if index < self.position {
            self.position -= 1;
        }

        true
    }

    /// Move the item at `from` to `to`, keeping the cursor on the same item
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from >= len || to >= len || from == to {
            return false;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if from == self.position {
            self.position = to;
        } else if from < self.position && to >= self.position {
            self.position -= 1;
        } else if from > self.position && to <= self.position {
            self.position += 1;
        }

        true
    }

    /// Make `index` current and play it
    pub fn jump_to(&mut self, index: usize, transport: &mut dyn TransportPort) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.step_to(index, TransitionReason::Manual, transport);
        true
    }

    /// Play the next item
    pub fn advance(&mut self, transport: &mut dyn TransportPort) -> bool {
        if !self.has_next() {
            return false;
        }

        let reason = if self.is_next_same_song() {
            TransitionReason::QueueNavigation
        } else {
            TransitionReason::Manual
        };

        self.step_to(self.position + 1, reason, transport);
        true
    }

    /// Play the previous item, or restart the current one
    ///
    /// Once playback is past `start_at` plus the restart threshold the
    /// current track is sought back to its start and the cursor stays put.
    pub fn retreat(&mut self, transport: &mut dyn TransportPort) -> bool {
        let Some(current) = self.now_playing() else {
            return false;
        };

        let start = current.track.start_seconds();
        let elapsed = transport.elapsed_seconds().ceil();

        if elapsed > start + self.restart_threshold {
            debug!(elapsed, start, "Restarting current track instead of going back");
            transport.set_transition_reason(TransitionReason::QueueNavigation);
            transport.seek(start);
            return true;
        }

        if !self.has_previous() {
            return false;
        }

        let reason = if self.is_previous_same_song() {
            TransitionReason::QueueNavigation
        } else {
            TransitionReason::Manual
        };

        self.step_to(self.position - 1, reason, transport);
        true
    }

    /// Advance at the end of a track, applying the repeat policy
    pub fn advance_with_repeat(&mut self, transport: &mut dyn TransportPort) -> bool {
        if self.has_next() {
            return self.advance(transport);
        }
        self.apply_repeat(TransitionReason::AutoAdvance, transport)
    }

    /// Advance once playback leaves the current track's window
    ///
    /// Like `advance_with_repeat` but tagged `AutoJump`. With repeat off and
    /// nothing queued after, the widget is paused since the video itself
    /// keeps playing.
    pub fn advance_past_window(&mut self, transport: &mut dyn TransportPort) -> bool {
        if self.has_next() {
            self.step_to(self.position + 1, TransitionReason::AutoJump, transport);
            return true;
        }
        if self.apply_repeat(TransitionReason::AutoJump, transport) {
            return true;
        }
        if self.is_empty() {
            return false;
        }
        transport.halt();
        true
    }

    /// Randomize the queue, keeping the current item current at index 0
    pub fn shuffle(&mut self) -> bool {
        self.shuffle_with(&mut rand::thread_rng())
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.items.len() <= 1 {
            debug!("Queue too short to shuffle");
            return false;
        }
        self.position = shuffle_pinned(&mut self.items, self.position, rng);
        debug!(len = self.items.len(), "Shuffled queue");
        true
    }

    /// Empty the queue and request a stop
    pub fn clear(&mut self) -> bool {
        debug!("Clearing queue, requesting stop");
        self.items.clear();
        self.position = 0;
        self.stop_requested = true;
        true
    }

    // ===== Internal =====

    fn step_to(&mut self, index: usize, reason: TransitionReason, transport: &mut dyn TransportPort) {
        transport.set_transition_reason(reason);
        self.position = index;
        transport.load_and_play(&self.items[index]);
    }

    /// Repeat handling once the last item has finished
    fn apply_repeat(&mut self, reason: TransitionReason, transport: &mut dyn TransportPort) -> bool {
        match transport.repeat_mode() {
            RepeatMode::All if !self.items.is_empty() => {
                self.step_to(0, reason, transport);
                true
            }
            RepeatMode::One => {
                let Some(current) = self.now_playing() else {
                    return false;
                };
                let start = current.track.start_seconds();
                transport.set_transition_reason(reason);
                transport.seek(start);
                transport.resume();
                true
            }
            _ => {
                debug!("End of queue reached, repeat off");
                false
            }
        }
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QueuePort for QueueEngine {
    fn now_playing(&self) -> Option<&QueueItem> {
        QueueEngine::now_playing(self)
    }

    fn is_initializing(&self) -> bool {
        self.initializing
    }

    fn advance_with_repeat(&mut self, transport: &mut dyn TransportPort) -> bool {
        QueueEngine::advance_with_repeat(self, transport)
    }

    fn advance_past_window(&mut self, transport: &mut dyn TransportPort) -> bool {
        QueueEngine::advance_past_window(self, transport)
    }
}
