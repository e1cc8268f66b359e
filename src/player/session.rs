//! Per-guild playback sessions and the loop that drives them.

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::Weak;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use super::connection::PlaybackHandle;
use super::connection::TrackDone;
use super::connection::VoiceConnection;
use super::queue::QueuePage;
use super::queue::TrackQueue;
use super::registry::Registry;
use super::track::Track;
use super::PlayerConfig;
use crate::error::UserError;
use crate::notify::Notifier;
use crate::serenity;

/// A playing track and its transport handle.
struct Current {
    track: Track,
    handle: Box<dyn PlaybackHandle>,
}

/// Everything commands and the playback loop mutate, behind one lock.
struct PlayerState {
    /// Live voice connection, absent until `connect`.
    conn: Option<Arc<dyn VoiceConnection>>,
    /// The track currently playing.
    current: Option<Current>,
    /// Replay the current track when it finishes.
    looping: bool,
    /// Whether the current track is paused.
    paused: bool,
    /// Set by `skip` so the loop advances even while looping.
    skip_requested: bool,
    /// Volume applied to every played track, 1.0 meaning 100%.
    volume: f32,
}

/// One guild's playback state plus the background task driving it.
///
/// Sessions are created through [Registry::get_or_create] and only die
/// through [Registry::teardown]; between those two points the playback
/// loop owns the queue's consumer end.
pub struct Session {
    guild_id: serenity::GuildId,
    /// Text channel the session was created from; the drain notice
    /// goes here.
    origin: serenity::ChannelId,
    /// Pending tracks.
    queue: TrackQueue,
    state: Mutex<PlayerState>,
    /// Now-playing and drain announcements.
    notifier: Arc<dyn Notifier>,
    config: PlayerConfig,
    /// Back-reference for the drain path's self-teardown.
    registry: Weak<Registry>,
    /// The playback loop task, aborted on teardown.
    task: OnceLock<JoinHandle<()>>,
}

impl Session {
    /// Create a session and spawn its playback loop.
    pub(super) fn spawn(
        guild_id: serenity::GuildId,
        origin: serenity::ChannelId,
        config: PlayerConfig,
        notifier: Arc<dyn Notifier>,
        registry: Weak<Registry>,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            guild_id,
            origin,
            queue: TrackQueue::new(),
            state: Mutex::new(PlayerState {
                conn: None,
                current: None,
                looping: false,
                paused: false,
                skip_requested: false,
                volume: config.default_volume,
            }),
            notifier,
            config,
            registry,
            task: OnceLock::new(),
        });

        let task = tokio::spawn(playback_loop(session.clone()));
        // The slot is empty, the session was just created.
        let _ = session.task.set(task);

        session
    }

    /// Attach the voice connection, replacing any previous one when
    /// the bot moves channels.
    pub async fn connect(&self, conn: Arc<dyn VoiceConnection>) {
        self.state.lock().await.conn = Some(conn);
    }

    /// Append a resolved track; wakes the loop if it was waiting.
    pub async fn enqueue(&self, track: Track) {
        debug!(guild = %self.guild_id, title = %track.title, "queueing track");
        self.queue.push(track).await;
    }

    /// The track currently playing, if any.
    pub async fn current(&self) -> Option<Track> {
        let state = self.state.lock().await;
        state.current.as_ref().map(|c| c.track.clone())
    }

    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused
    }

    pub async fn is_looping(&self) -> bool {
        self.state.lock().await.looping
    }

    /// Current volume on the user-facing percent scale.
    pub async fn volume(&self) -> i64 {
        (self.state.lock().await.volume * 100.0).round() as i64
    }

    /// Set the volume in percent (0 to 200), applying it to the live
    /// track right away. Works in any state; idle sessions keep the
    /// value for the next track.
    pub async fn set_volume(&self, percent: i64) -> Result<(), UserError> {
        if !(0..=200).contains(&percent) {
            return Err(UserError::VolumeOutOfRange);
        }

        let mut state = self.state.lock().await;
        state.volume = percent as f32 / 100.0;
        if let Some(current) = &state.current {
            if let Err(e) = current.handle.set_volume(state.volume) {
                debug!(guild = %self.guild_id, "volume update on live track failed: {e}");
            }
        }
        Ok(())
    }

    /// Pause the current track.
    pub async fn pause(&self) -> Result<(), UserError> {
        let mut state = self.state.lock().await;
        let current = state.current.as_ref().ok_or(UserError::NothingPlaying)?;
        if state.paused {
            return Err(UserError::AlreadyPaused);
        }

        if let Err(e) = current.handle.pause() {
            warn!(guild = %self.guild_id, "pause failed: {e}");
            return Err(UserError::NothingPlaying);
        }
        state.paused = true;
        Ok(())
    }

    /// Resume a paused track.
    pub async fn resume(&self) -> Result<(), UserError> {
        let mut state = self.state.lock().await;
        let current = state.current.as_ref().ok_or(UserError::NothingPlaying)?;
        if !state.paused {
            return Err(UserError::NotPaused);
        }

        if let Err(e) = current.handle.resume() {
            warn!(guild = %self.guild_id, "resume failed: {e}");
            return Err(UserError::NothingPlaying);
        }
        state.paused = false;
        Ok(())
    }

    /// Stop the current track early and return it. The completion
    /// signal then advances the loop, past the track even when looping.
    pub async fn skip(&self) -> Result<Track, UserError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        let current = state.current.as_ref().ok_or(UserError::NothingPlaying)?;
        let track = current.track.clone();

        state.skip_requested = true;
        if let Err(e) = current.handle.stop() {
            warn!(guild = %self.guild_id, "stop on skip failed: {e}");
            return Err(UserError::NothingPlaying);
        }

        info!(guild = %self.guild_id, title = %track.title, "skipping");
        Ok(track)
    }

    /// Toggle replaying the current track, returning the new setting.
    pub async fn toggle_loop(&self) -> Result<bool, UserError> {
        let mut state = self.state.lock().await;
        if state.current.is_none() {
            return Err(UserError::NothingPlaying);
        }

        state.looping = !state.looping;
        Ok(state.looping)
    }

    /// Remove a pending track by the 1-based position shown in the
    /// queue listing.
    pub async fn remove(&self, position: usize) -> Result<Track, UserError> {
        let len = self.queue.len().await;
        let out_of_range = || UserError::InvalidQueueIndex {
            index: position,
            len,
        };

        let index = position.checked_sub(1).ok_or_else(out_of_range)?;
        self.queue.remove(index).await.ok_or_else(out_of_range)
    }

    /// Shuffle the pending tracks.
    pub async fn shuffle(&self) -> Result<(), UserError> {
        if self.queue.len().await < 2 {
            return Err(UserError::NotEnoughQueued);
        }
        self.queue.shuffle().await;
        Ok(())
    }

    /// One page of the pending tracks.
    pub async fn queue_page(&self, page: usize) -> QueuePage {
        self.queue.page(page, self.config.page_size).await
    }

    /// Number of pending tracks.
    pub async fn queue_len(&self) -> usize {
        self.queue.len().await
    }

    /// Release everything held: pending tracks, the current track, and
    /// the voice connection.
    async fn halt(&self) {
        self.queue.clear().await;

        let mut state = self.state.lock().await;
        if let Some(current) = state.current.take() {
            if let Err(e) = current.handle.stop() {
                debug!(guild = %self.guild_id, "stop during halt failed: {e}");
            }
        }
        state.paused = false;
        state.looping = false;
        state.skip_requested = false;

        if let Some(conn) = state.conn.take() {
            if let Err(e) = conn.disconnect().await {
                warn!(guild = %self.guild_id, "disconnect failed: {e}");
            }
        }
    }

    /// Halt and cancel the playback loop. Only called from
    /// [Registry::teardown], after the registry entry is gone.
    pub(super) async fn shutdown(&self) {
        self.halt().await;
        // Abort last, with no awaits after it: the loop itself runs
        // this on the drain path, and cancellation only lands at the
        // next await point.
        if let Some(task) = self.task.get() {
            task.abort();
        }
    }
}

/// The background playback loop, one task per session.
///
/// Suspends in two places: waiting on the queue (bounded by the idle
/// timeout) and waiting for the current track to finish. Teardown
/// aborts the task at either point.
#[instrument(skip_all, fields(guild = %session.guild_id))]
async fn playback_loop(session: Arc<Session>) {
    loop {
        // Pick the next track: replay the current one when looping,
        // unless a skip asked to move on. Otherwise wait on the queue.
        let replay = {
            let mut state = session.state.lock().await;
            let skipped = std::mem::take(&mut state.skip_requested);
            match &state.current {
                Some(current) if state.looping && !skipped => Some(current.track.clone()),
                _ => {
                    state.current = None;
                    None
                }
            }
        };

        let next = match replay {
            Some(track) => track,
            None => match session.queue.next(session.config.idle_timeout).await {
                Some(track) => track,
                None => {
                    // The queue stayed empty for the whole timeout.
                    info!(
                        "queue empty for {}s, leaving",
                        session.config.idle_timeout.as_secs()
                    );
                    if let Err(e) = session.notifier.queue_drained(session.origin).await {
                        debug!("drain notice failed: {e}");
                    }
                    match session.registry.upgrade() {
                        Some(registry) => {
                            registry.teardown(session.guild_id).await;
                        }
                        None => warn!("registry dropped before the drain teardown"),
                    }
                    return;
                }
            },
        };

        let (conn, volume) = {
            let state = session.state.lock().await;
            match state.conn.clone() {
                Some(conn) => (conn, state.volume),
                None => {
                    // A track with nothing to play it on. Should not
                    // happen: commands connect before they enqueue.
                    error!(title = %next.title, "no voice connection, dropping the session");
                    drop(state);
                    if let Some(registry) = session.registry.upgrade() {
                        registry.teardown(session.guild_id).await;
                    }
                    return;
                }
            }
        };

        let (done, done_rx) = TrackDone::channel();
        let handle = match conn.play(&next, volume, done).await {
            Ok(handle) => handle,
            Err(e) => {
                // Fatal to this track only, move on.
                error!(title = %next.title, "could not start playback: {e}");
                continue;
            }
        };

        {
            let mut state = session.state.lock().await;
            state.current = Some(Current {
                track: next.clone(),
                handle,
            });
            state.paused = false;
        }

        info!(title = %next.title, "now playing");
        if let Err(e) = session.notifier.now_playing(&next).await {
            debug!("now-playing notice failed: {e}");
        }

        // Wait for the transport to finish the track.
        match done_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(title = %next.title, "playback failed: {e}");
                session.state.lock().await.current = None;
            }
            Err(_) => {
                warn!(title = %next.title, "transport dropped the completion signal");
                session.state.lock().await.current = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::super::testutil::make_track;
    use super::super::testutil::FakeConnection;
    use super::super::testutil::RecordingNotifier;
    use super::*;
    use crate::error::PlaybackError;

    /// A session with `a` already playing on a fake transport.
    async fn playing_session() -> (
        Arc<Registry>,
        Arc<Session>,
        Arc<FakeConnection>,
        Arc<RecordingNotifier>,
    ) {
        let notifier = RecordingNotifier::new();
        let registry = Registry::new(PlayerConfig::default(), notifier.clone());
        let session = registry
            .get_or_create(serenity::GuildId::new(9), serenity::ChannelId::new(7))
            .await;

        let conn = FakeConnection::new();
        session.connect(conn.clone()).await;
        session.enqueue(make_track("a")).await;
        conn.wait_started(1).await;

        (registry, session, conn, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn tracks_play_in_queue_order_without_further_commands() {
        let (_registry, session, conn, notifier) = playing_session().await;
        session.enqueue(make_track("b")).await;
        session.enqueue(make_track("c")).await;

        conn.finish(Ok(())).await;
        conn.wait_started(2).await;
        conn.finish(Ok(())).await;
        conn.wait_started(3).await;

        assert_eq!(conn.started_titles().await, ["a", "b", "c"]);
        assert_eq!(*notifier.announced.lock().await, ["a", "b", "c"]);
        assert_eq!(session.current().await.unwrap().title, "c");
    }

    #[tokio::test(start_paused = true)]
    async fn looping_replays_until_skip() {
        let (_registry, session, conn, _notifier) = playing_session().await;
        assert!(session.toggle_loop().await.unwrap());

        conn.finish(Ok(())).await;
        conn.wait_started(2).await;

        session.enqueue(make_track("b")).await;
        let skipped = session.skip().await.unwrap();
        assert_eq!(skipped.title, "a");
        conn.wait_started(3).await;

        assert_eq!(conn.started_titles().await, ["a", "a", "b"]);
        // Skipping moves on but leaves the loop setting alone.
        assert!(session.is_looping().await);
    }

    #[tokio::test(start_paused = true)]
    async fn control_commands_need_a_playing_track() {
        let notifier = RecordingNotifier::new();
        let registry = Registry::new(PlayerConfig::default(), notifier);
        let session = registry
            .get_or_create(serenity::GuildId::new(9), serenity::ChannelId::new(7))
            .await;

        assert!(matches!(session.skip().await, Err(UserError::NothingPlaying)));
        assert!(matches!(session.pause().await, Err(UserError::NothingPlaying)));
        assert!(matches!(session.resume().await, Err(UserError::NothingPlaying)));
        assert!(matches!(
            session.toggle_loop().await,
            Err(UserError::NothingPlaying)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_gate_on_state() {
        let (_registry, session, _conn, _notifier) = playing_session().await;
        assert!(!session.is_paused().await);

        session.pause().await.unwrap();
        assert!(session.is_paused().await);
        assert!(matches!(session.pause().await, Err(UserError::AlreadyPaused)));

        session.resume().await.unwrap();
        assert!(!session.is_paused().await);
        assert!(matches!(session.resume().await, Err(UserError::NotPaused)));
    }

    #[tokio::test(start_paused = true)]
    async fn volume_rejects_out_of_range_values() {
        let (_registry, session, conn, _notifier) = playing_session().await;

        assert!(matches!(
            session.set_volume(-1).await,
            Err(UserError::VolumeOutOfRange)
        ));
        assert!(matches!(
            session.set_volume(250).await,
            Err(UserError::VolumeOutOfRange)
        ));
        assert_eq!(session.volume().await, 50);

        session.set_volume(100).await.unwrap();
        assert_eq!(session.volume().await, 100);

        // The next track starts with the new volume.
        conn.finish(Ok(())).await;
        session.enqueue(make_track("b")).await;
        conn.wait_started(2).await;
        assert_eq!(conn.started_volumes().await, [0.5, 1.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_commands_work_against_the_pending_tracks() {
        let (_registry, session, _conn, _notifier) = playing_session().await;
        for title in ["b", "c", "d"] {
            session.enqueue(make_track(title)).await;
        }

        let listing = session.queue_page(1).await;
        let titles: Vec<&str> = listing.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["b", "c", "d"]);

        let removed = session.remove(2).await.unwrap();
        assert_eq!(removed.title, "c");
        assert!(matches!(
            session.remove(7).await,
            Err(UserError::InvalidQueueIndex { .. })
        ));
        assert!(matches!(
            session.remove(0).await,
            Err(UserError::InvalidQueueIndex { .. })
        ));

        session.shuffle().await.unwrap();
        let listing = session.queue_page(1).await;
        assert_eq!(listing.total, 2);
        let mut titles: Vec<String> = listing.tracks.into_iter().map(|t| t.title).collect();
        titles.sort();
        assert_eq!(titles, ["b", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shuffle_needs_at_least_two_pending_tracks() {
        let (_registry, session, _conn, _notifier) = playing_session().await;
        assert!(matches!(
            session.shuffle().await,
            Err(UserError::NotEnoughQueued)
        ));

        session.enqueue(make_track("b")).await;
        assert!(matches!(
            session.shuffle().await,
            Err(UserError::NotEnoughQueued)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_track_does_not_kill_the_session() {
        let (_registry, session, conn, _notifier) = playing_session().await;
        session.enqueue(make_track("b")).await;

        conn.finish(Err(PlaybackError::Transport("stream cut".to_string())))
            .await;
        conn.wait_started(2).await;

        assert_eq!(conn.started_titles().await, ["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn a_track_that_refuses_to_start_is_dropped() {
        let notifier = RecordingNotifier::new();
        let registry = Registry::new(PlayerConfig::default(), notifier.clone());
        let session = registry
            .get_or_create(serenity::GuildId::new(9), serenity::ChannelId::new(7))
            .await;
        let conn = FakeConnection::new();
        session.connect(conn.clone()).await;

        conn.fail_plays.store(true, Ordering::SeqCst);
        session.enqueue(make_track("a")).await;
        conn.wait_started(1).await;

        conn.fail_plays.store(false, Ordering::SeqCst);
        session.enqueue(make_track("b")).await;
        conn.wait_started(2).await;

        assert_eq!(conn.started_titles().await, ["a", "b"]);
        assert_eq!(*notifier.announced.lock().await, ["b"]);
        assert_eq!(session.current().await.unwrap().title, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn an_idle_queue_drains_the_session() {
        let notifier = RecordingNotifier::new();
        let config = PlayerConfig {
            idle_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let registry = Registry::new(config, notifier.clone());
        let session = registry
            .get_or_create(serenity::GuildId::new(9), serenity::ChannelId::new(7))
            .await;
        let conn = FakeConnection::new();
        session.connect(conn.clone()).await;

        session.enqueue(make_track("a")).await;
        conn.wait_started(1).await;
        conn.finish(Ok(())).await;

        // Sit out the idle timeout, then let the teardown settle.
        tokio::time::sleep(Duration::from_secs(6)).await;
        for _ in 0..100 {
            if registry.is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(registry.is_empty().await);
        assert!(conn.is_disconnected());
        assert_eq!(
            notifier.drained.lock().await.as_slice(),
            [serenity::ChannelId::new(7)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_playback_and_clears_the_queue() {
        let (registry, session, conn, _notifier) = playing_session().await;
        session.enqueue(make_track("b")).await;

        assert!(registry.teardown(serenity::GuildId::new(9)).await);

        assert!(conn.is_disconnected());
        assert_eq!(session.queue_len().await, 0);
        assert!(session.current().await.is_none());
    }
}
