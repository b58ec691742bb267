//! Library components of the `gridview` CLI.

pub mod config;
pub mod logging;
pub mod render;
pub mod screen;
