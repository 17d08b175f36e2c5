pub mod samples;
pub mod summary;

pub use samples::*;
pub use summary::*;
