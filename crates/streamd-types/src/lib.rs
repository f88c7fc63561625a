//! Foundation types for streamd.
//!
//! This crate provides the return-code taxonomy and shared value types used
//! throughout the daemon. Every other streamd crate depends on
//! `streamd-types`.
//!
//! # Key Types
//!
//! - [`ReturnCode`] — Closed set of outcomes carried on the wire
//! - [`ControlError`] — Error form of the taxonomy with context strings
//! - [`PipelineState`] — The four pipeline states and their text names

pub mod code;
pub mod error;
pub mod state;

pub use code::ReturnCode;
pub use error::{ControlError, ControlResult};
pub use state::PipelineState;
