//! Implements the `/skip` command.
//!
//! The bot will skip the current track and start playing the next one
//! in the queue (if there is one).

use tracing::instrument;

use crate::voice;
use crate::CocoError;
use crate::Context;

/// Skips the current audio track.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, guild_cooldown = 2)]
pub async fn skip(ctx: Context<'_>) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    let skipped = session.skip().await?;
    ctx.reply(format!("Skipping `{}`", skipped.title)).await?;
    Ok(())
}
