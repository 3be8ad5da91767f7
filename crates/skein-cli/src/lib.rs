//! # skein-cli
//!
//! The `skein` binary. `skein build` resolves every entry's module graph and
//! writes one bundle per entry plus any files loaders emitted; `skein check`
//! validates the config and explains which rule and loader chain governs a
//! given path.
//!
//! The library target exists so the commands can be driven from integration
//! tests without spawning a process.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;
