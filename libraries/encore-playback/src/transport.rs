//! Transport controller
//!
//! Owns playback intent and drives the embedded widget. It is the only
//! component allowed to issue widget commands, so queue navigation, retries
//! and transport buttons all go through it.
//!
//! State machine:
//! ```text
//! UNSTARTED -> CUED -> PLAYING <-> PAUSED / BUFFERING -> ENDED
//!                         \______________________________/
//!                                 any -> ERROR (retries exhausted)
//! ```
//! ENDED is not terminal: it feeds back into the queue's
//! `advance_with_repeat`.

use crate::events::PlaybackEvent;
use crate::ports::{QueuePort, TransportPort};
use crate::types::{PlayerState, QueueItem, RepeatMode, TransitionReason};
use crate::widget::{VideoWidget, WidgetReadiness};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default retry counter maximum
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Observable transport state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    /// Last state reported by the widget
    pub player_state: PlayerState,

    /// Consecutive playback errors (reset once playback starts)
    pub retry_count: u32,

    /// Volume level (0-100)
    pub volume: u8,

    pub muted: bool,

    pub repeat_mode: RepeatMode,

    pub shuffle_enabled: bool,

    /// Why the current track last changed
    pub transition_reason: Option<TransitionReason>,

    /// Whether the last load should start playing
    pub should_auto_play: bool,

    /// Mirrored playback time in seconds
    pub current_time: f64,

    /// Mirrored video duration in seconds (0 until known)
    pub duration: f64,

    /// Snapshot of the loaded track
    pub current_track: Option<QueueItem>,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            player_state: PlayerState::Unstarted,
            retry_count: 0,
            volume: 100,
            muted: false,
            repeat_mode: RepeatMode::Off,
            shuffle_enabled: false,
            transition_reason: None,
            should_auto_play: false,
            current_time: 0.0,
            duration: 0.0,
            current_track: None,
        }
    }
}

/// Load waiting for the widget to become ready
#[derive(Debug, Clone, PartialEq)]
struct PendingLoad {
    media_id: String,
    start_seconds: f64,
    auto_play: bool,
}

/// Bridges queue decisions to the widget and widget callbacks back to the queue
pub struct TransportController {
    state: TransportState,
    max_retries: u32,

    widget: Option<Box<dyn VideoWidget>>,
    ready_tx: watch::Sender<bool>,

    /// Most recent load issued before the widget was ready
    pending_load: Option<PendingLoad>,

    /// A retry load was issued and its outcome not yet observed
    retry_in_flight: bool,

    /// End of the current track's window already acted upon
    window_end_handled: bool,

    pending_events: Vec<PlaybackEvent>,
}

impl TransportController {
    pub fn new(max_retries: u32) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            state: TransportState::default(),
            max_retries: max_retries.max(1),
            widget: None,
            ready_tx,
            pending_load: None,
            retry_in_flight: false,
            window_end_handled: false,
            pending_events: Vec::new(),
        }
    }

    // ===== Widget lifecycle =====

    /// Attach the widget handle
    ///
    /// Commands still wait for `on_widget_ready`.
    pub fn attach_widget(&mut self, widget: Box<dyn VideoWidget>) {
        self.widget = Some(widget);
    }

    /// Drop the widget handle (the UI unmounted it)
    pub fn detach_widget(&mut self) {
        self.widget = None;
        self.ready_tx.send_replace(false);
    }

    pub fn is_ready(&self) -> bool {
        self.widget.is_some() && *self.ready_tx.borrow()
    }

    /// Awaitable readiness signal
    pub fn readiness(&self) -> WidgetReadiness {
        WidgetReadiness::new(self.ready_tx.subscribe())
    }

    // ===== Queries =====

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_retrying(&self) -> bool {
        self.retry_in_flight
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending_load.is_some()
    }

    // ===== Commands =====

    /// Load a track into the widget
    ///
    /// Deferred until the widget is ready; a newer load replaces a deferred
    /// one. Resets the retry counter.
    pub fn load_track(&mut self, item: &QueueItem, auto_play: bool) {
        self.state.retry_count = 0;
        self.retry_in_flight = false;
        self.prepare(item, auto_play);
    }

    pub fn play(&mut self) {
        if let Some(widget) = self.ready_widget("play") {
            widget.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(widget) = self.ready_widget("pause") {
            widget.pause();
        }
    }

    pub fn stop(&mut self) {
        self.state.should_auto_play = false;
        if let Some(widget) = self.ready_widget("stop") {
            widget.stop();
        }
    }

    /// Stop and forget the loaded track (the queue emptied)
    pub fn eject(&mut self) {
        self.pending_load = None;
        self.retry_in_flight = false;
        self.state.current_track = None;
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.stop();
    }

    pub fn seek(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if let Some(widget) = self.ready_widget("seek") {
            widget.seek_to(seconds);
            self.state.current_time = seconds;
            self.window_end_handled = false;
        }
    }

    pub fn set_volume(&mut self, level: u8) {
        self.state.volume = level.min(100);
        self.apply_volume();
    }

    pub fn mute(&mut self) {
        self.state.muted = true;
        self.apply_volume();
    }

    pub fn unmute(&mut self) {
        self.state.muted = false;
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.apply_volume();
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.state.repeat_mode = mode;
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.state.shuffle_enabled = enabled;
    }

    /// Restore persisted settings without touching the widget
    pub(crate) fn restore_settings(
        &mut self,
        volume: u8,
        muted: bool,
        repeat_mode: RepeatMode,
        shuffle_enabled: bool,
    ) {
        self.state.volume = volume.min(100);
        self.state.muted = muted;
        self.state.repeat_mode = repeat_mode;
        self.state.shuffle_enabled = shuffle_enabled;
    }

    pub(crate) fn restore_current_track(&mut self, item: Option<QueueItem>) {
        self.state.current_track = item;
    }

    // ===== Widget callbacks =====

    /// Widget finished loading; replay the latest deferred load
    pub fn on_widget_ready(&mut self) {
        if self.widget.is_none() {
            warn!("Ready callback without an attached widget");
            return;
        }

        info!("Video widget ready");
        self.ready_tx.send_replace(true);
        self.apply_volume();

        if let Some(load) = self.pending_load.take() {
            debug!(media_id = %load.media_id, "Replaying deferred load");
            self.issue(&load);
        }
    }

    /// Widget reported a new playback state
    pub fn on_widget_state_changed(&mut self, new_state: PlayerState, queue: &mut dyn QueuePort) {
        let old_state = self.state.player_state;
        self.state.player_state = new_state;
        debug!(?old_state, ?new_state, "Widget state changed");

        match new_state {
            PlayerState::Playing if old_state != PlayerState::Playing => {
                self.state.retry_count = 0;
                self.retry_in_flight = false;

                if queue.is_initializing() {
                    debug!("Playback started during restore, not reporting");
                    return;
                }

                if let Some(item) = self.state.current_track.clone() {
                    self.pending_events.push(PlaybackEvent::TrackStarted {
                        item,
                        reason: self.state.transition_reason,
                    });
                }
            }
            PlayerState::Ended => {
                if queue.is_initializing() {
                    debug!("Track ended during restore, not advancing");
                    return;
                }
                queue.advance_with_repeat(self);
            }
            _ => {}
        }
    }

    /// Widget reported the playback time
    ///
    /// Crossing the track's `end_at` while playing counts as the end of
    /// the track.
    pub fn on_time_update(&mut self, seconds: f64, queue: &mut dyn QueuePort) {
        self.state.current_time = seconds;

        if queue.is_initializing()
            || self.window_end_handled
            || !self.state.player_state.is_playing()
        {
            return;
        }

        let Some(end_at) = self
            .state
            .current_track
            .as_ref()
            .and_then(|item| item.track.end_at)
        else {
            return;
        };

        if seconds >= f64::from(end_at) {
            debug!(seconds, end_at, "Reached end of track window");
            self.window_end_handled = true;
            queue.advance_past_window(self);
        }
    }

    pub fn on_duration_known(&mut self, seconds: f64) {
        self.state.duration = seconds;
    }

    /// Widget failed to play the current track
    ///
    /// Retries the current track until the counter reaches the maximum,
    /// then gives up with an `Error` transition and leaves playback stopped.
    pub fn on_widget_error(&mut self, code: i32, queue: &dyn QueuePort) {
        if self.retry_in_flight && self.pending_load.is_some() {
            debug!(code, "Retry not issued yet, ignoring error");
            return;
        }
        self.retry_in_flight = false;

        self.state.retry_count = (self.state.retry_count + 1).min(self.max_retries);
        warn!(
            code,
            retry_count = self.state.retry_count,
            max_retries = self.max_retries,
            "Widget playback error"
        );

        if self.state.retry_count < self.max_retries {
            let Some(item) = queue.now_playing().cloned() else {
                debug!("Nothing to retry");
                return;
            };
            info!(track_id = item.track.id, attempt = self.state.retry_count, "Retrying track");
            self.retry_in_flight = true;
            let auto_play = self.state.should_auto_play;
            self.prepare(&item, auto_play);
            return;
        }

        warn!("Retries exhausted, stopping playback");
        self.state.player_state = PlayerState::Error;
        self.record_reason(TransitionReason::Error);
        self.stop();
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    fn prepare(&mut self, item: &QueueItem, auto_play: bool) {
        self.state.current_track = Some(item.clone());
        self.state.should_auto_play = auto_play;
        // The previous video's state no longer applies until the widget reports again
        self.state.player_state = if auto_play {
            PlayerState::Unstarted
        } else {
            PlayerState::Cued
        };
        self.state.current_time = item.track.start_seconds();
        self.state.duration = 0.0;
        self.window_end_handled = false;

        let Some(media_id) = item.track.embed_id() else {
            warn!(
                track_id = item.track.id,
                url = %item.track.video.url,
                "No embeddable video id, not loading"
            );
            return;
        };

        let load = PendingLoad {
            media_id,
            start_seconds: item.track.start_seconds(),
            auto_play,
        };

        if self.is_ready() {
            self.pending_load = None;
            self.issue(&load);
        } else {
            debug!(media_id = %load.media_id, "Widget not ready, deferring load");
            self.pending_load = Some(load);
        }
    }

    fn issue(&mut self, load: &PendingLoad) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        widget.cue(&load.media_id, load.start_seconds);
        if load.auto_play {
            widget.play();
        }
    }

    fn ready_widget(&mut self, command: &str) -> Option<&mut (dyn VideoWidget + 'static)> {
        if !self.is_ready() {
            warn!(command, "Video widget not ready, dropping command");
            return None;
        }
        self.widget.as_deref_mut()
    }

    fn apply_volume(&mut self) {
        if !self.is_ready() {
            return;
        }
        let (level, muted) = (self.state.volume, self.state.muted);
        if let Some(widget) = self.widget.as_mut() {
            widget.set_volume(level, muted);
        }
    }

    fn record_reason(&mut self, reason: TransitionReason) {
        self.state.transition_reason = Some(reason);
        self.pending_events
            .push(PlaybackEvent::TransitionChanged { reason });
    }
}

impl Default for TransportController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl TransportPort for TransportController {
    fn load_and_play(&mut self, item: &QueueItem) {
        self.load_track(item, true);
    }

    fn cue(&mut self, item: &QueueItem) {
        self.load_track(item, false);
    }

    fn seek(&mut self, seconds: f64) {
        TransportController::seek(self, seconds);
    }

    fn resume(&mut self) {
        if !self.state.player_state.is_playing() {
            self.play();
        }
    }

    fn halt(&mut self) {
        self.pause();
    }

    fn elapsed_seconds(&self) -> f64 {
        self.state.current_time
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.state.repeat_mode
    }

    fn set_transition_reason(&mut self, reason: TransitionReason) {
        self.record_reason(reason);
    }
}
