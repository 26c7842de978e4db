// ASLSleuth - lib.rs
//
// Library entry point, exposing every layer for integration testing and
// programmatic use. The `aslsleuth` binary in `main.rs` is a thin CLI over
// this surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
