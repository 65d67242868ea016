//! Playback manager - composition root
//!
//! Coordinates the queue engine, the transport controller and the
//! persistence store. Every committed mutation is written through to
//! storage; widget callbacks only persist when they moved the queue.

use crate::{
    catalog::{Catalog, CatalogQuery},
    config::PlaybackConfig,
    error::Result,
    events::PlaybackEvent,
    persistence::{DeviceStorage, MemoryStorage, PlaybackStore},
    queue::QueueEngine,
    transport::{TransportController, TransportState},
    types::{PlayerState, QueueItem, QueueOrigin, RepeatMode},
    widget::{VideoWidget, WidgetReadiness},
};
use rand::seq::SliceRandom;
use std::future::Future;
use tracing::{debug, info};

/// Main playback manager
///
/// Single-threaded: all calls, widget callbacks included, are expected on
/// the thread that owns the widget.
pub struct PlaybackManager {
    config: PlaybackConfig,
    queue: QueueEngine,
    transport: TransportController,
    store: PlaybackStore,
}

impl PlaybackManager {
    /// Create a new playback manager persisting to `storage`
    pub fn new(config: PlaybackConfig, storage: Box<dyn DeviceStorage>) -> Self {
        let mut transport = TransportController::new(config.max_retries);
        transport.set_volume(config.initial_volume);

        Self {
            queue: QueueEngine::with_restart_threshold(config.restart_threshold_secs),
            store: PlaybackStore::new(storage, config.storage_prefix.clone()),
            transport,
            config,
        }
    }

    /// Create a playback manager whose state lives only in memory
    pub fn in_memory(config: PlaybackConfig) -> Self {
        Self::new(config, Box::new(MemoryStorage::new()))
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Startup =====

    /// Restore persisted state
    ///
    /// Runs with the queue in its initializing phase, so no auto-play side
    /// effect fires. A restored queue leaves its current track cued, never
    /// playing.
    pub fn restore(&mut self) {
        self.queue.begin_restore();

        let restored = self.store.restore();

        match restored.settings {
            Some(settings) => self.transport.restore_settings(
                settings.volume,
                settings.muted,
                settings.repeat_mode,
                settings.shuffle_enabled,
            ),
            None => self.transport.restore_settings(
                self.config.initial_volume,
                false,
                RepeatMode::Off,
                false,
            ),
        }

        self.queue.restore(restored.items, restored.position);

        if let Some(item) = self.queue.now_playing().cloned() {
            self.transport.load_track(&item, false);
        } else {
            self.transport.restore_current_track(restored.current_track);
        }

        self.queue.finish_restore();

        info!(
            len = self.queue.len(),
            position = self.queue.position(),
            "Playback state restored"
        );
    }

    // ===== Widget =====

    pub fn attach_widget(&mut self, widget: Box<dyn VideoWidget>) {
        self.transport.attach_widget(widget);
    }

    pub fn detach_widget(&mut self) {
        self.transport.detach_widget();
    }

    pub fn is_ready(&self) -> bool {
        self.transport.is_ready()
    }

    pub fn readiness(&self) -> WidgetReadiness {
        self.transport.readiness()
    }

    /// Wait for the widget, bounded by the configured readiness timeout
    ///
    /// The returned future does not borrow the manager, so the ready
    /// callback can still be delivered while it is pending.
    pub fn wait_until_ready(&self) -> impl Future<Output = Result<()>> + 'static {
        let mut readiness = self.transport.readiness();
        let timeout = self.config.readiness_timeout();
        async move { readiness.wait_timeout(timeout).await }
    }

    pub fn on_widget_ready(&mut self) {
        self.transport.on_widget_ready();
    }

    pub fn on_widget_state_changed(&mut self, state: PlayerState) {
        let before = self.queue_mark();
        self.transport.on_widget_state_changed(state, &mut self.queue);
        self.persist_if_moved(before);
    }

    /// Widget state callback carrying the raw numeric code
    pub fn on_widget_state_code(&mut self, code: i32) {
        match PlayerState::from_widget_code(code) {
            Some(state) => self.on_widget_state_changed(state),
            None => debug!(code, "Ignoring unknown widget state code"),
        }
    }

    pub fn on_time_update(&mut self, seconds: f64) {
        let before = self.queue_mark();
        self.transport.on_time_update(seconds, &mut self.queue);
        self.persist_if_moved(before);
    }

    pub fn on_duration_known(&mut self, seconds: f64) {
        self.transport.on_duration_known(seconds);
    }

    pub fn on_widget_error(&mut self, code: i32) {
        self.transport.on_widget_error(code, &self.queue);
    }

    // ===== Playback Control =====

    pub fn play(&mut self) {
        self.transport.play();
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    pub fn stop(&mut self) {
        self.transport.stop();
    }

    pub fn seek(&mut self, seconds: f64) {
        self.transport.seek(seconds);
    }

    /// Play the next track
    pub fn next(&mut self) -> bool {
        let moved = self.queue.advance(&mut self.transport);
        self.commit(moved)
    }

    /// Play the previous track (or restart the current one)
    pub fn previous(&mut self) -> bool {
        let moved = self.queue.retreat(&mut self.transport);
        self.commit(moved)
    }

    // ===== Volume =====

    pub fn set_volume(&mut self, level: u8) {
        self.transport.set_volume(level);
        self.persist();
    }

    pub fn get_volume(&self) -> u8 {
        self.transport.state().volume
    }

    pub fn mute(&mut self) {
        self.transport.mute();
        self.persist();
    }

    pub fn unmute(&mut self) {
        self.transport.unmute();
        self.persist();
    }

    pub fn toggle_mute(&mut self) {
        self.transport.toggle_mute();
        self.persist();
    }

    pub fn is_muted(&self) -> bool {
        self.transport.state().muted
    }

    // ===== Queue Management =====

    /// Replace the queue without starting playback
    ///
    /// With shuffle enabled the incoming items are shuffled first.
    pub fn set_queue(&mut self, mut items: Vec<QueueItem>) {
        if self.transport.state().shuffle_enabled {
            items.shuffle(&mut rand::thread_rng());
        }
        self.queue.set_queue(items);
        self.persist();
    }

    /// Replace the queue and start playing at `start`
    ///
    /// With shuffle enabled the rest of the queue is shuffled around the
    /// started item.
    pub fn play_queue(&mut self, items: Vec<QueueItem>, start: usize) -> bool {
        self.queue.set_queue(items);
        if !self.queue.jump_to(start, &mut self.transport) {
            self.persist();
            return false;
        }
        if self.transport.state().shuffle_enabled {
            self.queue.shuffle();
        }
        self.commit(true)
    }

    pub fn enqueue(&mut self, item: QueueItem, to_front: bool) -> bool {
        let added = self.queue.enqueue(item, to_front, &mut self.transport);
        self.commit(added)
    }

    pub fn remove_at(&mut self, index: usize) -> bool {
        let removed = self.queue.remove_at(index, &mut self.transport);
        self.commit(removed)
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let moved = self.queue.move_item(from, to);
        self.commit(moved)
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        let jumped = self.queue.jump_to(index, &mut self.transport);
        self.commit(jumped)
    }

    pub fn shuffle(&mut self) -> bool {
        let shuffled = self.queue.shuffle();
        self.commit(shuffled)
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.commit(true);
    }

    pub fn queue(&self) -> &QueueEngine {
        &self.queue
    }

    pub fn now_playing(&self) -> Option<&QueueItem> {
        self.queue.now_playing()
    }

    pub fn has_next(&self) -> bool {
        self.queue.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.queue.has_previous()
    }

    // ===== Shuffle & Repeat =====

    /// Toggle the shuffle flag
    ///
    /// Enabling shuffles the current queue once. Disabling keeps the
    /// shuffled order.
    pub fn set_shuffle(&mut self, enabled: bool) {
        let was_enabled = self.transport.state().shuffle_enabled;
        self.transport.set_shuffle(enabled);
        if enabled && !was_enabled {
            self.queue.shuffle();
        }
        self.persist();
    }

    pub fn get_shuffle(&self) -> bool {
        self.transport.state().shuffle_enabled
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.transport.set_repeat_mode(mode);
        self.persist();
    }

    pub fn get_repeat(&self) -> RepeatMode {
        self.transport.state().repeat_mode
    }

    // ===== State Queries =====

    pub fn state(&self) -> &TransportState {
        self.transport.state()
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.transport.drain_events()
    }

    // ===== Catalog =====

    /// Replace the queue with one page of catalog results
    ///
    /// Returns the number of queued tracks. Playback is not started.
    pub async fn queue_from_catalog(
        &mut self,
        catalog: &dyn Catalog,
        query: &CatalogQuery,
    ) -> Result<usize> {
        let tracks = catalog.fetch_tracks(query).await?;
        let count = tracks.len();
        debug!(count, ?query, "Queueing catalog results");

        let items = tracks
            .into_iter()
            .map(|track| QueueItem::from_origin(track, QueueOrigin::Search))
            .collect();
        self.set_queue(items);
        Ok(count)
    }

    /// Fetch one track and add it to the queue
    pub async fn enqueue_from_catalog(
        &mut self,
        catalog: &dyn Catalog,
        id: i64,
        to_front: bool,
    ) -> Result<()> {
        let track = catalog.fetch_track_by_id(id).await?;
        self.enqueue(QueueItem::from_origin(track, QueueOrigin::Search), to_front);
        Ok(())
    }

    // ===== Internal =====

    fn queue_mark(&self) -> (usize, usize) {
        (self.queue.position(), self.queue.len())
    }

    fn persist_if_moved(&mut self, before: (usize, usize)) {
        if self.queue_mark() != before {
            self.persist();
        }
    }

    /// Apply a pending stop request and persist when `changed`
    fn commit(&mut self, changed: bool) -> bool {
        if self.queue.take_stop_request() {
            debug!("Queue emptied, stopping playback");
            self.transport.eject();
        }
        if changed {
            self.persist();
        }
        changed
    }

    fn persist(&mut self) {
        if self.queue.is_initializing() {
            return;
        }
        self.store.save(&self.queue, self.transport.state());
    }
}

impl Default for PlaybackManager {
    fn default() -> Self {
        Self::in_memory(PlaybackConfig::default())
    }
}
