pub mod archive;
pub mod binstub;
pub mod build_plan;
pub mod changelog;
pub mod check;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod inventory;
pub mod layout;
pub mod runner;
pub mod shutdown;
pub mod ui;

pub use error::{BuilderError, Result};
