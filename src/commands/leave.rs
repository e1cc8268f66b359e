//! Implements the `/leave` command.
//!
//! Stops playback, deletes the queue, disconnects from voice, and
//! forgets the session.

use tracing::instrument;

use crate::error::UserError;
use crate::CocoError;
use crate::Context;

/// Disconnect the bot from its voice channel.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>) -> Result<(), CocoError> {
    let guild_id = ctx.guild_id().ok_or(UserError::GuildOnly)?;

    if !ctx.data().players.teardown(guild_id).await {
        Err(UserError::NotConnected)?;
    }
    ctx.reply("Disconnected.").await?;
    Ok(())
}
