pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod fixture;
pub mod generator;
pub mod registry;

pub use error::{Error, Result};
