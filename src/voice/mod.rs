//! Joining voice channels and wiring songbird into the player.

mod driver;
mod events;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing::instrument;

use crate::error::CocoError;
use crate::error::UserError;
use crate::player::Session;
use crate::serenity;
use crate::Context;
use driver::SongbirdConnection;

/// Convenient type alias for a shared [songbird::Call].
pub type CallRef = Arc<Mutex<songbird::Call>>;
/// Convenient type alias for [songbird::Songbird].
type Manager = Arc<songbird::Songbird>;

/// Get the [Manager] from [Context]
async fn get_manager(ctx: &Context<'_>) -> Result<Manager, CocoError> {
    songbird::get(ctx.serenity_context())
        .await
        .ok_or(CocoError::MissingFromSetup {
            reason: "Expecting songbird manager.".to_string(),
        })
}

/// The voice channel the command author sits in.
fn author_channel(ctx: &Context<'_>) -> Result<serenity::ChannelId, CocoError> {
    let author = ctx.author();

    let voice_states = match ctx.guild() {
        Some(guild) => guild.voice_states.clone(),
        None => Err(UserError::GuildOnly)?,
    };

    match voice_states.get(&author.id).and_then(|vs| vs.channel_id) {
        Some(channel_id) => Ok(channel_id),
        None => Err(UserError::NotInVoice)?,
    }
}

/// Join `channel`, or the author's voice channel when `None`, and hand
/// the connection to the guild's session, creating one if needed.
///
/// Joining while already connected moves the bot, the session and its
/// queue carry over.
#[instrument(skip(ctx), fields(author = %ctx.author(), guild = ?ctx.guild_id()))]
pub async fn connect(
    ctx: &Context<'_>,
    channel: Option<serenity::ChannelId>,
) -> Result<Arc<Session>, CocoError> {
    let guild_id = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    let channel_id = match channel {
        Some(id) => id,
        None => author_channel(ctx)?,
    };

    let manager = get_manager(ctx).await?;
    let fresh_call = manager.get(guild_id).is_none();

    info!("joining voice channel {channel_id}");
    let call = manager.join(guild_id, channel_id).await?;

    let players = ctx.data().players.clone();
    let session = players.get_or_create(guild_id, ctx.channel_id()).await;

    if fresh_call {
        // First join in this guild, watch for the driver dropping out.
        events::watch_disconnects(&call, players, guild_id).await;
    }

    session
        .connect(Arc::new(SongbirdConnection::new(
            manager,
            call,
            guild_id,
            ctx.data().http.clone(),
        )))
        .await;

    Ok(session)
}

/// The guild's live session, for commands that need one to exist.
pub async fn get_session(ctx: &Context<'_>) -> Result<Arc<Session>, CocoError> {
    let guild_id = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    let session = ctx.data().players.get(guild_id).await;
    Ok(session.ok_or(UserError::NotConnected)?)
}
