//! Implements the `/pause` and `/resume` commands.

use tracing::instrument;

use crate::voice;
use crate::CocoError;
use crate::Context;

/// Pause the current track.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn pause(ctx: Context<'_>) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    session.pause().await?;
    ctx.reply("Paused.").await?;
    Ok(())
}

/// Resume a paused track.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn resume(ctx: Context<'_>) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    session.resume().await?;
    ctx.reply("Resumed.").await?;
    Ok(())
}
