//! Implements the `/join` command.
//!
//! The bot joins the given voice channel, or the author's when none is
//! given. Joining while connected somewhere else moves the bot.

use tracing::instrument;

use crate::error::UserError;
use crate::serenity;
use crate::voice;
use crate::CocoError;
use crate::Context;

/// Join a voice channel.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only)]
pub async fn join(
    ctx: Context<'_>,
    #[description = "Voice channel to join, defaults to yours"]
    #[channel_types("Voice")]
    channel: Option<serenity::GuildChannel>,
) -> Result<(), CocoError> {
    let channel = match channel {
        Some(channel) if channel.kind != serenity::ChannelType::Voice => {
            Err(UserError::NotAVoiceChannel)?
        }
        Some(channel) => Some(channel.id),
        None => None,
    };

    voice::connect(&ctx, channel).await?;
    ctx.reply("Connected.").await?;
    Ok(())
}
