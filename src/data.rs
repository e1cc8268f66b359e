//! Shared state handed to every command.

use std::collections::HashSet;
use std::sync::Arc;

use crate::player::Registry;
use crate::resolver::StreamResolver;
use crate::serenity;

/// The data kept between shards.
pub struct Data {
    /// List of users to send bug notifications.
    pub notify_list: HashSet<serenity::UserId>,
    /// Per-guild playback sessions.
    pub players: Arc<Registry>,
    /// Resolves play queries into streams.
    pub resolver: Arc<dyn StreamResolver>,
    /// Shared http client the voice driver streams through.
    pub http: reqwest::Client,
}
