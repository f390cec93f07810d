//! Console server: the session guard in front of the console's pages.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
