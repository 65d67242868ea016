//! Playback Events
//!
//! The two signals observers (UI, analytics) may rely on:
//! - the transition reason changed
//! - a track actually started playing, as confirmed by the widget

use crate::types::{QueueItem, TransitionReason};
use serde::{Deserialize, Serialize};

/// Events emitted by the transport controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Reason for the most recent track change was updated
    ///
    /// `Error` here means retries were exhausted and playback is stopped.
    TransitionChanged {
        reason: TransitionReason,
    },

    /// Widget confirmed playback of a track
    ///
    /// Emitted once per transition into the playing state, never while a
    /// restore is in progress. Analytics should count plays from this
    /// event rather than from queue navigation.
    TrackStarted {
        item: QueueItem,
        /// Reason recorded when the track was loaded
        reason: Option<TransitionReason>,
    },
}
