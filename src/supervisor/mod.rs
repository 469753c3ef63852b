//! Supervisor module for retrying runs and permission policy.

mod backoff;
mod error;
mod policy;
mod runner;
mod state;

pub use backoff::*;
pub use error::*;
pub use policy::*;
pub use runner::*;
pub use state::*;
