//! Wire types for the webforge backend.
//!
//! This crate contains the serde-serializable shapes exchanged with the
//! generation backend: the HTTP request and response bodies and the JSON
//! frames carried on the per-project progress channel.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization and small accessors
//! * Tolerant: optional fields default instead of failing the whole frame
//! * Stable: Changes only when the wire contract changes
//!
//! The session state machine that interprets these types lives in `webforge-core`.

pub mod channel;
pub mod options;
pub mod project;
pub mod user;

pub use channel::*;
pub use options::*;
pub use project::*;
pub use user::*;
