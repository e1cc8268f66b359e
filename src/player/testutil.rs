//! Test doubles for the transport and notifier seams.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::Notify;

use super::connection::PlaybackHandle;
use super::connection::TrackDone;
use super::connection::TrackOutcome;
use super::connection::VoiceConnection;
use super::track::Track;
use crate::error::CocoError;
use crate::error::PlaybackError;
use crate::notify::Notifier;
use crate::resolver::StreamInfo;
use crate::serenity;

/// A minimal track for queue and session tests.
pub fn make_track(title: &str) -> Track {
    Track::new(
        StreamInfo {
            title: title.to_string(),
            url: format!("https://example.com/watch?v={title}"),
            stream_url: format!("https://cdn.example.com/{title}.webm"),
            duration: Some(Duration::from_secs(180)),
            uploader: Some("tester".to_string()),
            thumbnail: None,
        },
        serenity::UserId::new(1),
        serenity::ChannelId::new(42),
    )
}

/// Transport double. Records every started track and lets the test
/// decide when and how each one finishes.
#[derive(Default)]
pub struct FakeConnection {
    started: Mutex<Vec<String>>,
    volumes: Mutex<Vec<f32>>,
    /// Completion signal of the most recently started track.
    pending: Mutex<Option<TrackDone>>,
    pub disconnected: AtomicBool,
    /// When set, `play` records the attempt and then refuses it.
    pub fail_plays: AtomicBool,
    started_notify: Notify,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Park until at least `n` tracks have been started.
    pub async fn wait_started(&self, n: usize) {
        loop {
            if self.started.lock().await.len() >= n {
                return;
            }
            self.started_notify.notified().await;
        }
    }

    /// Finish the current track with the given outcome.
    pub async fn finish(&self, outcome: TrackOutcome) {
        let done = self
            .pending
            .lock()
            .await
            .take()
            .expect("a track should be playing");
        done.signal(outcome);
    }

    /// Titles in the order the session started them.
    pub async fn started_titles(&self) -> Vec<String> {
        self.started.lock().await.clone()
    }

    /// Volumes each track was started with.
    pub async fn started_volumes(&self) -> Vec<f32> {
        self.volumes.lock().await.clone()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    async fn play(
        &self,
        track: &Track,
        volume: f32,
        done: TrackDone,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        self.started.lock().await.push(track.title.clone());
        self.volumes.lock().await.push(volume);
        self.started_notify.notify_one();

        if self.fail_plays.load(Ordering::SeqCst) {
            return Err(PlaybackError::Transport("refused by test".to_string()));
        }

        *self.pending.lock().await = Some(done.clone());
        Ok(Box::new(FakeHandle { done }))
    }

    async fn disconnect(&self) -> Result<(), PlaybackError> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Handle double. `stop` completes the track the way a real transport
/// would, by firing the completion signal.
struct FakeHandle {
    done: TrackDone,
}

impl PlaybackHandle for FakeHandle {
    fn pause(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn resume(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), PlaybackError> {
        self.done.signal(Ok(()));
        Ok(())
    }

    fn set_volume(&self, _volume: f32) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// Notifier double recording every announcement.
#[derive(Default)]
pub struct RecordingNotifier {
    pub announced: Mutex<Vec<String>>,
    pub drained: Mutex<Vec<serenity::ChannelId>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn now_playing(&self, track: &Track) -> Result<(), CocoError> {
        self.announced.lock().await.push(track.title.clone());
        Ok(())
    }

    async fn queue_drained(&self, channel: serenity::ChannelId) -> Result<(), CocoError> {
        self.drained.lock().await.push(channel);
        Ok(())
    }
}
