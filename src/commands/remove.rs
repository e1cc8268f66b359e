//! Implements the `/remove` command.

use tracing::instrument;

use crate::voice;
use crate::CocoError;
use crate::Context;

/// Remove a song from the queue by its position.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position as shown by /queue"]
    #[min = 1]
    index: u32,
) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    let removed = session.remove(index as usize).await?;
    ctx.reply(format!("Removed `{}`.", removed.title)).await?;
    Ok(())
}
