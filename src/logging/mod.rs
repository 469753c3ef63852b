//! Logging module: the injected run-log sink and process-wide setup.

mod format;
mod init;
mod sink;

pub use format::*;
pub use init::*;
pub use sink::*;
