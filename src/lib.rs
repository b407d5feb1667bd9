pub mod backend;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod record;
pub mod report;
pub mod runner;
pub mod token;
pub mod util;
