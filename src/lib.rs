//! Library crate for mass-verify-rs: drive a masscan sweep, then verify and
//! normalize its results.
pub mod blacklist;
pub mod engine;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod types;
pub mod verify;
