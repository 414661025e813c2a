//! Domain models for the TPA desk.

mod authorization;
mod case;
mod discharge;
mod gap;
mod lifecycle;
mod status;

pub use authorization::*;
pub use case::*;
pub use discharge::*;
pub use gap::*;
pub use lifecycle::*;
pub use status::*;
