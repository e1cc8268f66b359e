//! Bot commands.

mod join;
mod leave;
mod looping;
mod now;
mod pause;
mod play;
mod queue;
mod remove;
mod shuffle;
mod skip;
mod stop;
mod volume;

use crate::CocoError;
use crate::Data;

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, CocoError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        join::join(),
        leave::leave(),
        play::play(),
        stop::stop(),
        pause::pause(),
        pause::resume(),
        skip::skip(),
        queue::queue(),
        remove::remove(),
        volume::volume(),
        looping::looping(),
        shuffle::shuffle(),
        now::now(),
    ]
}
