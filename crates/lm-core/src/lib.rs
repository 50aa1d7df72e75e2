//! Logmask core: masked structured logging and configuration resolution.
//!
//! The masking engine itself lives in `lm-mask`. This crate wires it into a
//! `tracing` subscriber, resolves which masking config to use, and hosts the
//! `lm-core` command line.

pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod stream;
