//! Implements the `/play` command.
//!
//! Resolves the query, joins the author's voice channel when not
//! already connected, and queues the track.

use tracing::instrument;

use crate::player::Track;
use crate::voice;
use crate::CocoError;
use crate::Context;

/// Play from a link, or search youtube for the query.
#[instrument(err, skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Youtube query or url"] query: String,
) -> Result<(), CocoError> {
    // Resolution can take a while, keep the interaction alive.
    ctx.defer().await?;

    let session = voice::connect(&ctx, None).await?;

    let info = ctx.data().resolver.resolve(&query).await?;
    let track = Track::new(info, ctx.author().id, ctx.channel_id());
    let title = track.title.clone();
    session.enqueue(track).await;

    ctx.say(format!("Enqueued `{title}`.")).await?;
    Ok(())
}
