//! Songbird-backed implementation of the playback transport.

use std::sync::Arc;

use async_trait::async_trait;
use songbird::input::HttpRequest;
use songbird::input::Input;
use songbird::tracks::TrackHandle;
use songbird::Event;
use songbird::EventContext;
use songbird::EventHandler;
use songbird::TrackEvent;
use tracing::debug;

use super::CallRef;
use crate::error::PlaybackError;
use crate::player::connection::PlaybackHandle;
use crate::player::connection::TrackDone;
use crate::player::connection::VoiceConnection;
use crate::player::Track;
use crate::serenity;

/// Plays resolved tracks through a [songbird::Call].
pub struct SongbirdConnection {
    /// Needed to fully release the call on disconnect.
    manager: Arc<songbird::Songbird>,
    call: CallRef,
    guild_id: serenity::GuildId,
    /// Client the driver streams audio through.
    http: reqwest::Client,
}

impl SongbirdConnection {
    pub fn new(
        manager: Arc<songbird::Songbird>,
        call: CallRef,
        guild_id: serenity::GuildId,
        http: reqwest::Client,
    ) -> Self {
        Self {
            manager,
            call,
            guild_id,
            http,
        }
    }
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn play(
        &self,
        track: &Track,
        volume: f32,
        done: TrackDone,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let input: Input = HttpRequest::new(self.http.clone(), track.stream_url.clone()).into();

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input)
        };

        handle.set_volume(volume).map_err(control_error)?;

        // One watcher per lifecycle event; whichever fires first wins.
        handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotice { done: done.clone() },
            )
            .map_err(control_error)?;
        handle
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorNotice {
                    done,
                    title: track.title.clone(),
                },
            )
            .map_err(control_error)?;

        Ok(Box::new(SongbirdHandle { handle }))
    }

    async fn disconnect(&self) -> Result<(), PlaybackError> {
        debug!(guild = %self.guild_id, "releasing voice call");
        self.manager
            .remove(self.guild_id)
            .await
            .map_err(|e| PlaybackError::Transport(e.to_string()))
    }
}

fn control_error(e: songbird::tracks::ControlError) -> PlaybackError {
    PlaybackError::Control(e.to_string())
}

/// Fires the completion signal when the driver finishes or stops the
/// track.
struct TrackEndNotice {
    done: TrackDone,
}

#[async_trait]
impl EventHandler for TrackEndNotice {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        self.done.signal(Ok(()));
        None
    }
}

/// Fires the completion signal when the driver gives up on the track.
struct TrackErrorNotice {
    done: TrackDone,
    title: String,
}

#[async_trait]
impl EventHandler for TrackErrorNotice {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!("driver gave up on `{}`", self.title);
        self.done.signal(Err(PlaybackError::Transport(format!(
            "driver gave up on `{}`",
            self.title
        ))));
        None
    }
}

/// Control surface over a live [TrackHandle].
struct SongbirdHandle {
    handle: TrackHandle,
}

impl PlaybackHandle for SongbirdHandle {
    fn pause(&self) -> Result<(), PlaybackError> {
        self.handle.pause().map_err(control_error)
    }

    fn resume(&self) -> Result<(), PlaybackError> {
        self.handle.play().map_err(control_error)
    }

    fn stop(&self) -> Result<(), PlaybackError> {
        self.handle.stop().map_err(control_error)
    }

    fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        self.handle.set_volume(volume).map_err(control_error)
    }
}
