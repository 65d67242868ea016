//! Embedded video widget abstraction
//!
//! The widget is owned by the UI layer that embeds it. The transport
//! controller only holds a command handle and receives the widget's
//! callbacks through its `on_*` methods.

use crate::error::{PlaybackError, Result};
use std::time::Duration;
use tokio::sync::watch;

/// Command surface of the embedded video widget
///
/// Implemented by the UI binding. Commands are fire-and-forget; outcomes
/// arrive later as state-change or error callbacks.
pub trait VideoWidget {
    /// Load a video without starting it
    fn cue(&mut self, media_id: &str, start_seconds: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn seek_to(&mut self, seconds: f64);

    /// Apply volume (0-100) and mute state
    ///
    /// Widgets without volume control can ignore this.
    fn set_volume(&mut self, _level: u8, _muted: bool) {}
}

/// Awaitable view of widget readiness
///
/// Obtained from [`crate::TransportController::readiness`]. Replaces fixed
/// start-up delays: dependents wait for the widget's ready callback.
#[derive(Debug, Clone)]
pub struct WidgetReadiness {
    rx: watch::Receiver<bool>,
}

impl WidgetReadiness {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the widget reports ready
    ///
    /// Fails if the controller is dropped first.
    pub async fn wait(&mut self) -> Result<()> {
        self.rx
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| PlaybackError::WidgetNotAttached)
    }

    /// Wait until the widget reports ready, giving up after `timeout`
    pub async fn wait_timeout(&mut self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| PlaybackError::ReadinessTimeout(timeout))?
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Widget command as seen by the test double
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Command {
        Cue(String, f64),
        Play,
        Pause,
        Stop,
        SeekTo(f64),
        Volume(u8, bool),
    }

    /// Widget double sharing its command log with the test
    #[derive(Clone, Default)]
    pub(crate) struct RecordingWidget {
        pub log: Rc<RefCell<Vec<Command>>>,
    }

    impl RecordingWidget {
        pub fn commands(&self) -> Vec<Command> {
            self.log.borrow().clone()
        }

        pub fn clear(&self) {
            self.log.borrow_mut().clear();
        }
    }

    impl VideoWidget for RecordingWidget {
        fn cue(&mut self, media_id: &str, start_seconds: f64) {
            self.log
                .borrow_mut()
                .push(Command::Cue(media_id.to_string(), start_seconds));
        }
        fn play(&mut self) {
            self.log.borrow_mut().push(Command::Play);
        }
        fn pause(&mut self) {
            self.log.borrow_mut().push(Command::Pause);
        }
        fn stop(&mut self) {
            self.log.borrow_mut().push(Command::Stop);
        }
        fn seek_to(&mut self, seconds: f64) {
            self.log.borrow_mut().push(Command::SeekTo(seconds));
        }
        fn set_volume(&mut self, level: u8, muted: bool) {
            self.log.borrow_mut().push(Command::Volume(level, muted));
        }
    }

    #[tokio::test]
    async fn wait_resolves_once_ready() {
        let (tx, rx) = watch::channel(false);
        let mut readiness = WidgetReadiness::new(rx);
        assert!(!readiness.is_ready());

        tx.send_replace(true);

        readiness
            .wait_timeout(Duration::from_millis(50))
            .await
            .unwrap();
        assert!(readiness.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out() {
        let (_tx, rx) = watch::channel(false);
        let mut readiness = WidgetReadiness::new(rx);

        let result = readiness.wait_timeout(Duration::from_secs(2)).await;
        assert!(matches!(result, Err(PlaybackError::ReadinessTimeout(_))));
    }

    #[tokio::test]
    async fn wait_fails_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        let mut readiness = WidgetReadiness::new(rx);
        drop(tx);

        let result = readiness.wait().await;
        assert!(matches!(result, Err(PlaybackError::WidgetNotAttached)));
    }
}
