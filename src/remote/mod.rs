pub mod client;
pub mod models;
pub mod transport;

#[cfg(test)]
pub mod scripted;

pub use client::MountApi;
pub use transport::Transport;
