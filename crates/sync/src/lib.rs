pub mod config;
pub mod constants;
pub mod error;
pub mod markup;
pub mod models;
pub mod notifications;
pub mod thread;
pub mod transport;
pub mod view;

#[cfg(test)]
mod tests;

pub use notifications::{AckOutcome, NotificationSync};
pub use thread::{SendOutcome, SyncMode, ThreadSync};
