pub mod args;
mod backup;
pub mod commands;
mod config;
pub mod engine;
mod error;
pub mod filter;
pub mod identity;
pub mod model;
pub mod session;
pub mod store;
pub mod summary;
mod utils;
mod working;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, ErrorType, Result};
pub use session::Session;
pub use store::Mode;
