pub mod cache;
pub mod resolve;
pub mod watch;

// Re-export command functions for convenience
pub use cache::{flush, stats};
pub use resolve::resolve;
pub use watch::watch;
