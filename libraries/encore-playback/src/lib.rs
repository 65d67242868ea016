//! Encore - Playback Queue & Transport
//!
//! Playback core for a song-archive player whose media lives inside an
//! embedded third-party video widget.
//!
//! This crate provides:
//! - Ordered playback queue with a cursor (enqueue, play next, remove, reorder)
//! - Track windows inside videos (`start_at` / `end_at`)
//! - "Previous" restarts the current track once it has played for 5 seconds
//! - Repeat modes (Off, All, One) and shuffle with the current track pinned
//! - Retry policy for widget playback errors
//! - Write-through persistence to device storage, with side-effect free restore
//!
//! # Architecture
//!
//! The queue engine decides *what* plays, the transport controller decides
//! *how* the widget is driven. They only see each other through the
//! [`TransportPort`] and [`QueuePort`] traits, and [`PlaybackManager`] wires
//! them to a [`PlaybackStore`].
//!
//! The widget itself is provided by the platform via the [`VideoWidget`]
//! trait. Its callbacks are fed back through the manager's `on_*` methods.
//!
//! # Example: Queue and Play
//!
//! ```rust
//! use encore_playback::{PlaybackManager, QueueItem, Track, Video};
//!
//! let mut manager = PlaybackManager::default();
//!
//! let track = Track {
//!     id: 1,
//!     video: Video {
//!         id: "dQw4w9WgXcQ".to_string(),
//!         url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
//!         ..Default::default()
//!     },
//!     title: "My Song".to_string(),
//!     artist: "Singer".to_string(),
//!     is_original: true,
//!     start_at: Some(95),
//!     end_at: Some(330),
//! };
//!
//! // Adding to an empty queue cues the track without playing it
//! manager.enqueue(QueueItem::from(track), false);
//! assert_eq!(manager.queue().len(), 1);
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use encore_playback::{PlaybackManager, PlayerState, VideoWidget};
//!
//! struct EmbeddedPlayer;
//!
//! impl VideoWidget for EmbeddedPlayer {
//!     fn cue(&mut self, _media_id: &str, _start_seconds: f64) {
//!         // Forward to the embedded player
//!     }
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek_to(&mut self, _seconds: f64) {}
//! }
//!
//! let mut manager = PlaybackManager::default();
//! manager.restore();
//! manager.attach_widget(Box::new(EmbeddedPlayer));
//!
//! // Later, from the widget's callbacks
//! manager.on_widget_ready();
//! manager.on_widget_state_changed(PlayerState::Playing);
//! manager.on_time_update(12.5);
//!
//! for event in manager.drain_events() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod catalog;
pub mod config;
mod error;
pub mod events;
pub mod media;
mod manager;
pub mod persistence;
pub mod ports;
pub mod queue;
mod shuffle;
pub mod transport;
pub mod types;
pub mod widget;

// Public exports
pub use catalog::{Catalog, CatalogQuery, InMemoryCatalog};
pub use config::PlaybackConfig;
pub use error::{PlaybackError, Result, StorageError};
pub use events::PlaybackEvent;
pub use manager::PlaybackManager;
pub use persistence::{DeviceStorage, FileStorage, MemoryStorage, PlaybackStore, PlayerSettings};
pub use ports::{QueuePort, TransportPort};
pub use queue::QueueEngine;
pub use shuffle::shuffle_pinned;
pub use transport::{TransportController, TransportState};
pub use types::{
    same_song, PlayerState, PlaylistId, QueueItem, QueueOrigin, RepeatMode, Track, TransitionReason,
    Video,
};
pub use widget::{VideoWidget, WidgetReadiness};
