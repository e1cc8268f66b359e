//! Per-guild music playback: the track queue, the playback session,
//! and the registry tying guilds to sessions.

pub mod connection;
mod queue;
mod registry;
mod session;
#[cfg(test)]
pub(crate) mod testutil;
mod track;

use std::time::Duration;

pub use queue::QueuePage;
pub use queue::TrackQueue;
pub use registry::Registry;
pub use session::Session;
pub use track::format_duration;
pub use track::Track;

/// Player tuning, read from the config file once at startup.
#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    /// Volume given to new sessions, 1.0 meaning 100%.
    pub default_volume: f32,
    /// How long a session waits on an empty queue before leaving.
    pub idle_timeout: Duration,
    /// Tracks shown per queue page.
    pub page_size: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            idle_timeout: Duration::from_secs(180),
            page_size: 10,
        }
    }
}
