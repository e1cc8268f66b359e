//! Implements the `/now` command.
//!
//! The bot responds with an embed showing the currently playing track.

use poise::CreateReply;
use tracing::instrument;

use crate::error::UserError;
use crate::notify::track_embed;
use crate::voice;
use crate::CocoError;
use crate::Context;

/// Show the currently playing track.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn now(ctx: Context<'_>) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;
    let track = session.current().await.ok_or(UserError::NothingPlaying)?;

    let title = if session.is_paused().await {
        "Now playing (paused)"
    } else {
        "Now playing"
    };
    let embed = track_embed(&track).title(title);

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
