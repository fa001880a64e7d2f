//! Purpose: Parser-result marshaling library used by the `handoff` CLI, tests and C consumers.
//! Exports: `api` (public Rust surface), `abi` (C surface), `core` (boundary types), `parse` (producer).
//! Role: Producer side of the handoff; everything a consumer releases is allocated here.
//! Invariants: Every owned boundary value has exactly one release path.
//! Invariants: Library code logs through `tracing` but never installs a subscriber.
pub mod abi;
pub mod api;
pub mod core;
pub mod parse;
