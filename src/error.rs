//! Error types for the bot.
//!
//! Split in two tiers: [UserError] for anything a user can see and fix
//! themselves, and [CocoError] as the umbrella everything else rolls
//! up into. The framework error handler in [crate::log] decides which
//! tier gets a reply and which gets a bug report.

use std::time::Duration;

use thiserror::Error;

use crate::serenity;

/// Errors caused by users, worded so they can be replied as-is.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("You are not in a voice channel.")]
    NotInVoice,
    #[error("I am not in a voice channel.")]
    NotConnected,
    #[error("I am not playing anything.")]
    NothingPlaying,
    #[error("Already paused.")]
    AlreadyPaused,
    #[error("Not paused.")]
    NotPaused,
    #[error("Not enough songs in the queue to shuffle.")]
    NotEnoughQueued,
    #[error("Invalid index `{index}`. The queue has {len} song(s).")]
    InvalidQueueIndex { index: usize, len: usize },
    #[error("Volume must be between 0 and 200.")]
    VolumeOutOfRange,
    #[error("That is not a voice channel.")]
    NotAVoiceChannel,
    #[error("Missing subcommand. Possible subcommands: {subcmds}")]
    MissingSubcommand { subcmds: String },
    #[error("Couldn't understand `{}`.", input.as_deref().unwrap_or("the arguments"))]
    BadArgs { input: Option<String> },
    #[error("On cooldown. Try again in {} second(s).", remaining_cooldown.as_secs())]
    OnCooldown { remaining_cooldown: Duration },
    #[error("I am missing permissions: {missing_permissions}.")]
    MissingBotPermissions {
        missing_permissions: serenity::Permissions,
    },
    #[error("You are missing permissions{}.", missing_permissions.map(|p| format!(": {p}")).unwrap_or_default())]
    MissingUserPermissions {
        missing_permissions: Option<serenity::Permissions>,
    },
    #[error("Only the bot owner can use this command.")]
    NotOwner,
    #[error("This command only works in servers.")]
    GuildOnly,
    #[error("This command only works in DMs.")]
    DmOnly,
    #[error("This command only works in NSFW channels.")]
    NsfwOnly,
}

/// Failures while resolving a query into a playable stream.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Couldn't find anything that matches `{0}`.")]
    NotFound(String),
    #[error("The media extractor failed: {0}")]
    Backend(String),
    #[error("Could not run the media extractor: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected media extractor output: {0}")]
    BadOutput(#[from] serde_json::Error),
    #[error("Media extractor output was not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Failures from the live audio transport.
///
/// Never surfaced to users directly; the playback loop logs these and
/// moves on to the next track.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio transport failed: {0}")]
    Transport(String),
    #[error("track control failed: {0}")]
    Control(String),
}

/// Errors from reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("No config file found. {action_msg}")]
    MissingConfig { action_msg: String },
    #[error(transparent)]
    IoError(std::io::Error),
}

/// Umbrella error for everything the bot can fail with.
#[derive(Debug, Error)]
pub enum CocoError {
    #[error(transparent)]
    UserError(#[from] UserError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Could not join the voice channel: {0}")]
    JoinVoice(#[from] songbird::error::JoinError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Discord API error: {0}")]
    Serenity(#[from] serenity::Error),
    #[error("Check failed: {}", reason.as_deref().unwrap_or("no reason given"))]
    CheckFailed { reason: Option<String> },
    #[error("Command panicked: {}", payload.as_deref().unwrap_or("no payload"))]
    Panic { payload: Option<String> },
    #[error("Mismatch between registered commands and discord's state: {description}")]
    CommandStructureMismatch { description: String },
    #[error("Missing from setup: {reason}")]
    MissingFromSetup { reason: String },
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
