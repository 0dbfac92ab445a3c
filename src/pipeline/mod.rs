//! Fetch, accumulate and render stages of one live chart, and the session
//! that supervises them.

pub mod renderer;
pub mod sampler;
pub mod session;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use session::{PipelineSession, SessionSettings};
