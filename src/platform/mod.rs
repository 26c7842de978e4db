// ASLSleuth - platform/mod.rs
//
// Platform abstraction layer: directories, config.toml, file reading.
// Dependencies: standard library, directories, memmap2, core option types.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
