//! Export of authorization summaries.

mod summary;

pub use summary::*;
