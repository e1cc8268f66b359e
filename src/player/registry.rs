//! The per-guild session registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;

use tokio::sync::Mutex;
use tracing::info;

use super::session::Session;
use super::PlayerConfig;
use crate::notify::Notifier;
use crate::serenity;

/// All live playback sessions, keyed by guild.
///
/// Entries only enter through [Registry::get_or_create] and only leave
/// through [Registry::teardown]. Both hold the map lock for the map
/// change itself, so racing commands always agree on which session a
/// guild has.
pub struct Registry {
    /// Handle to ourselves, handed to sessions for the drain path.
    me: Weak<Registry>,
    /// Player tuning shared by every session.
    config: PlayerConfig,
    /// Announcement sink shared by every session.
    notifier: Arc<dyn Notifier>,
    sessions: Mutex<HashMap<serenity::GuildId, Arc<Session>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(config: PlayerConfig, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            config,
            notifier,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// The guild's session, creating and spawning one if absent.
    ///
    /// `origin` is the text channel a fresh session reports to; an
    /// existing session keeps the channel it was created with.
    pub async fn get_or_create(
        &self,
        guild_id: serenity::GuildId,
        origin: serenity::ChannelId,
    ) -> Arc<Session> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&guild_id) {
            Some(session) => session.clone(),
            None => {
                info!(guild = %guild_id, "creating playback session");
                let session = Session::spawn(
                    guild_id,
                    origin,
                    self.config,
                    self.notifier.clone(),
                    self.me.clone(),
                );
                sessions.insert(guild_id, session.clone());
                session
            }
        }
    }

    /// The guild's session, if it has one.
    pub async fn get(&self, guild_id: serenity::GuildId) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(&guild_id).cloned()
    }

    /// Tear the guild's session down: forget it, stop playback, drop
    /// the queue, release the voice connection, cancel the loop task.
    ///
    /// Removing the map entry first settles races between `leave`,
    /// `stop`, the idle drain, and driver disconnects: the first
    /// caller through the lock does the work, everyone else gets
    /// `false` and an untouched registry.
    pub async fn teardown(&self, guild_id: serenity::GuildId) -> bool {
        let session = self.sessions.lock().await.remove(&guild_id);
        match session {
            Some(session) => {
                session.shutdown().await;
                info!(guild = %guild_id, "session torn down");
                true
            }
            None => false,
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
