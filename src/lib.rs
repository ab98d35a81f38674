pub mod args;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod model;
pub mod parse;
pub mod report;
mod utils;

#[cfg(test)]
mod test;

pub use config::{Config, InputFile};
pub use error::Error;
pub use error::Result;
