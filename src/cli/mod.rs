//! CLI module: subprocess spawning, stream decoding and message
//! classification for the supervised tool.

mod collector;
mod messages;
mod process;
mod stream;

pub use collector::*;
pub use messages::*;
pub use process::*;
pub use stream::*;
