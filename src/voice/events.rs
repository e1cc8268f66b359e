//! Global songbird event handling.

use std::sync::Arc;

use async_trait::async_trait;
use songbird::CoreEvent;
use songbird::Event;
use songbird::EventContext;
use songbird::EventHandler;
use tracing::info;

use super::CallRef;
use crate::player::Registry;
use crate::serenity;

/// Tear the session down when the driver loses the voice connection
/// (kicked, channel deleted, network gone). Registered once per call.
pub(super) async fn watch_disconnects(
    call: &CallRef,
    players: Arc<Registry>,
    guild_id: serenity::GuildId,
) {
    let handler = DisconnectCleanup { players, guild_id };
    let mut call = call.lock().await;
    call.add_global_event(Event::Core(CoreEvent::DriverDisconnect), handler);
}

struct DisconnectCleanup {
    players: Arc<Registry>,
    guild_id: serenity::GuildId,
}

#[async_trait]
impl EventHandler for DisconnectCleanup {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        // A normal teardown already removed the session; only an
        // unexpected disconnect still finds one to clean up.
        if self.players.teardown(self.guild_id).await {
            info!(guild = %self.guild_id, "driver disconnected, session cleaned up");
        }
        None
    }
}
