//! Narrow interfaces between the queue engine and the transport controller
//!
//! The queue decides *which* track is current; the transport decides *how*
//! the widget is driven. Each side only sees the other through these traits,
//! wired together by [`crate::PlaybackManager`].

use crate::types::{QueueItem, RepeatMode, TransitionReason};

/// What the queue engine needs from the transport
pub trait TransportPort {
    /// Load `item` and start playing it
    fn load_and_play(&mut self, item: &QueueItem);

    /// Load `item` without starting playback
    fn cue(&mut self, item: &QueueItem);

    /// Seek the current track
    fn seek(&mut self, seconds: f64);

    /// Resume playback if it is not already playing
    fn resume(&mut self);

    /// Pause the widget (used when a window ends with nothing to follow)
    fn halt(&mut self);

    /// Live playback time of the current track in seconds
    fn elapsed_seconds(&self) -> f64;

    /// Repeat policy shared with the transport state
    fn repeat_mode(&self) -> RepeatMode;

    /// Record why the current track is about to change
    fn set_transition_reason(&mut self, reason: TransitionReason);
}

/// What the transport controller needs from the queue engine
pub trait QueuePort {
    /// Current item, if the queue is not empty
    fn now_playing(&self) -> Option<&QueueItem>;

    /// Whether persisted state is being restored
    fn is_initializing(&self) -> bool;

    /// Advance after the widget reported the end of the track
    fn advance_with_repeat(&mut self, transport: &mut dyn TransportPort) -> bool;

    /// Advance after playback passed the end of the track's window
    fn advance_past_window(&mut self, transport: &mut dyn TransportPort) -> bool;
}
