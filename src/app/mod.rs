// ASLSleuth - app/mod.rs
//
// Application layer: decode/filter/render orchestration, follow mode, export.
// Dependencies: core, util.
// Must NOT depend on: CLI argument types.

pub mod export;
pub mod follow;
pub mod pipeline;
