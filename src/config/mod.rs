//! Configuration management for shredscan
//!
//! Layers, lowest priority first:
//!
//! 1. Embedded defaults (`assets/default-config.json`)
//! 2. User config: `~/.config/shredscan/config.{json,toml,yaml}`
//! 3. Project config: `./shredscan.{json,toml,yaml}`
//! 4. `SHREDSCAN_*` environment variables, nested with `__`
//!    (e.g. `SHREDSCAN_SCANNER__MAX_MATCHES=10`)
//!
//! An explicit `--config FILE` replaces layers 2 and 3.
//!
//! File types and scan patterns are validated on load: entries missing a
//! field, duplicates and patterns that are not valid regular expressions are
//! dropped with a warning instead of failing the load.

pub mod core;

pub use core::{ConfigFile, FileTypeEntry, PatternEntry, ShredscanConfig};
