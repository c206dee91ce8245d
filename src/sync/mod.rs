pub mod client;
pub mod debounce;
#[cfg(test)]
pub mod mock;
pub mod transport;

pub use client::{Outcome, SyncClient, WriteStatus};
pub use debounce::WriteScheduler;
pub use transport::HttpTransport;
