//! Services: background work and the engines behind the session
//!
//! Worker threads talk to the main loop only through the async bridge.

pub mod async_bridge;
pub mod cancellation;
pub mod elevated;
pub mod file_watcher;
pub mod loader;
pub mod reconciler;
pub mod search;
#[cfg(feature = "runtime")]
pub mod tracing_setup;
