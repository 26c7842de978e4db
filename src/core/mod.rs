// ASLSleuth - core/mod.rs
//
// Core normalisation layer: code tables, message model, parsers, filter and
// formatter.
// Dependencies: util (constants, error reasons, diagnostics) only.
// Must NOT depend on: platform, app, or perform any I/O.

pub mod codes;
pub mod filter;
pub mod formatter;
pub mod model;
pub mod parser;
