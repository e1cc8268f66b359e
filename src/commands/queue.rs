//! Implements the `/queue` command.
//!
//! The bot responds with an embed displaying one page of the songs in
//! the queue.

use std::fmt::Write;

use poise::CreateReply;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;
use tracing::instrument;

use crate::error::UserError;
use crate::serenity;
use crate::voice;
use crate::CocoError;
use crate::Context;

/// Show what's coming up
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, guild_cooldown = 2)]
pub async fn queue(
    ctx: Context<'_>,
    #[description = "Page to show"]
    #[min = 1]
    page: Option<u32>,
) -> Result<(), CocoError> {
    let guild = ctx.guild().ok_or(UserError::GuildOnly)?.name.clone();
    let session = voice::get_session(&ctx).await?;

    let page = page.unwrap_or(1).max(1) as usize;
    let listing = session.queue_page(page).await;

    if listing.total == 0 {
        ctx.reply("Empty queue.").await?;
        return Ok(());
    }

    let mut description = String::new();
    for (offset, track) in listing.tracks.iter().enumerate() {
        let position = listing.start + offset + 1;
        let next_line = format!("`{position}.` {track}");

        // An embed has a limit of 4096 chars
        if description.len() + next_line.len() > 4096 {
            break;
        }
        writeln!(description, "{next_line}").expect("write to string buffer can't fail");
    }

    let mut embed = CreateEmbed::default()
        .description(description)
        .title(format!("{guild} Queue"))
        .footer(CreateEmbedFooter::new(format!(
            "Page {} of {} | {} song(s)",
            listing.page, listing.pages, listing.total
        )));

    // Add thumbnail if the first listed track has one.
    if let Some(url) = listing.tracks.first().and_then(|t| t.thumbnail.as_deref()) {
        embed = embed.thumbnail(url)
    };

    let reply = CreateReply::default().embed(embed);

    ctx.send(reply).await?;

    Ok(())
}
