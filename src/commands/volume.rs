//! Implements the `/volume` command.

use tracing::instrument;

use crate::voice;
use crate::CocoError;
use crate::Context;

/// Show or set the playback volume.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "New volume in percent, 100 is normal"]
    #[min = 0]
    #[max = 200]
    percent: Option<i64>,
) -> Result<(), CocoError> {
    let session = voice::get_session(&ctx).await?;

    match percent {
        None => {
            let current = session.volume().await;
            ctx.reply(format!("Volume is {current}%.")).await?;
        }
        Some(percent) => {
            session.set_volume(percent).await?;
            ctx.reply(format!("Volume set to {percent}%.")).await?;
        }
    }
    Ok(())
}
