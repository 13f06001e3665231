//! Command-line front end for the tender scraper.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod notify;
pub mod output;
