//! Implements the `/stop` command.
//!
//! This stops playback, clears the queue, and disconnects the bot
//! from the current voice channel.

use tracing::instrument;

use crate::error::UserError;
use crate::CocoError;
use crate::Context;

/// Stop the music, delete the queue, and leave the call.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn stop(ctx: Context<'_>) -> Result<(), CocoError> {
    let guild_id = ctx.guild_id().ok_or(UserError::GuildOnly)?;

    tracing::info!("Stopping the queue.");
    if !ctx.data().players.teardown(guild_id).await {
        Err(UserError::NotConnected)?;
    }
    ctx.reply("Queue deleted.").await?;
    Ok(())
}
