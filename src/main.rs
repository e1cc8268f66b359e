//! A music bot for discord.

mod commands;
mod data;
mod error;
mod log;
mod notify;
mod player;
mod resolver;
mod setup;
mod voice;

pub use data::Data;
pub use error::CocoError;
pub use setup::Config;

/// Re-export with a convenient name. Poise's exported serenity is the
/// version the rest of the crate must agree with.
pub use poise::serenity_prelude as serenity;

/// Convenient type alias, only this [poise::Context] type is used.
type Context<'a> = poise::Context<'a, Data, CocoError>;

#[tokio::main]
async fn main() -> Result<(), CocoError> {
    // Config comes first, the logging setup needs it.
    let config = Config::read()?;

    // Keep the guard alive or file logging stops.
    let _guard = log::install_tracing(&config);

    let mut client = setup::client(config).await?;
    client.start().await?;

    Ok(())
}
