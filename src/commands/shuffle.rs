//! Implements the `/shuffle` command.

use tracing::instrument;

use crate::voice;
use crate::CocoError;
use crate::Context;

/// Shuffle the queue.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn shuffle(ctx: Context<'_>) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    session.shuffle().await?;
    ctx.reply("Shuffled.").await?;
    Ok(())
}
