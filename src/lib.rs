//! File bug tickets into Backlog with the warnings and errors recently logged,
//! an optional screenshot, and a description entered by the reporter.
pub mod app;
pub mod backlog;
pub mod config;
pub mod logging;
pub mod report;
pub mod screenshot;
