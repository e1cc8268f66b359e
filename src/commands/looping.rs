//! Implements the `/loop` command.

use tracing::instrument;

use crate::voice;
use crate::CocoError;
use crate::Context;

/// Toggle replaying the current track.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, rename = "loop")]
pub async fn looping(ctx: Context<'_>) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    let looping = session.toggle_loop().await?;
    let reply = if looping {
        "Looping the current track."
    } else {
        "Looping off."
    };
    ctx.reply(reply).await?;
    Ok(())
}
