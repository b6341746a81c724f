pub mod api;
pub mod chatlist;
pub mod client;
pub mod config;
pub mod net;
pub mod receipt;
pub mod session;
pub mod socket;
pub mod store;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::{Client, ClientError};
pub use config::Config;
pub use receipt::ReceiptStatus;
