//! Command-line front end for the webforge generator.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
