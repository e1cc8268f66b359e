//! Seam between the playback loop and the audio transport.
//!
//! The session only ever talks to these traits. The real transport
//! lives in [crate::voice]; tests swap in doubles.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::track::Track;
use crate::error::PlaybackError;

/// Outcome of one played track, delivered through [TrackDone].
pub type TrackOutcome = Result<(), PlaybackError>;

/// Single-use completion signal for one played track.
///
/// The transport fires it from whichever of its end or error callbacks
/// runs first; later fires are ignored. Cheap to clone so both
/// callbacks can hold one.
#[derive(Clone, Debug)]
pub struct TrackDone {
    tx: Arc<Mutex<Option<oneshot::Sender<TrackOutcome>>>>,
}

impl TrackDone {
    /// A fresh signal and the receiver the playback loop waits on.
    pub fn channel() -> (Self, oneshot::Receiver<TrackOutcome>) {
        let (tx, rx) = oneshot::channel();
        let done = Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        (done, rx)
    }

    /// Fire the signal. Only the first call has an effect.
    pub fn signal(&self, outcome: TrackOutcome) {
        let tx = self.tx.lock().ok().and_then(|mut slot| slot.take());
        if let Some(tx) = tx {
            // The receiver is gone if the session died first.
            let _ = tx.send(outcome);
        }
    }
}

/// A live voice-channel connection that can start playback.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Start playing `track` at `volume`, arranging for `done` to fire
    /// once the track ends or the transport gives up on it.
    async fn play(
        &self,
        track: &Track,
        volume: f32,
        done: TrackDone,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;

    /// Leave the voice channel and release the connection.
    async fn disconnect(&self) -> Result<(), PlaybackError>;
}

/// Control surface for the track currently playing.
pub trait PlaybackHandle: Send + Sync {
    /// Pause without losing the position.
    fn pause(&self) -> Result<(), PlaybackError>;
    /// Resume a paused track.
    fn resume(&self) -> Result<(), PlaybackError>;
    /// Stop the track; the transport then fires the completion signal.
    fn stop(&self) -> Result<(), PlaybackError>;
    /// Set the volume on the live stream, 1.0 meaning 100%.
    fn set_volume(&self, volume: f32) -> Result<(), PlaybackError>;
}
