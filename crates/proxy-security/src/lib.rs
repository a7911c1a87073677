//! Security/validation gate: schema-shape checks, field redaction with a
//! sealed side-channel for the original handler, and the per-call
//! execution-cap configuration.

mod gate;
mod redaction;
mod schema;

pub use gate::{run_gate, GateOutcome, SecurityConfig};
pub use redaction::RedactionSeal;
pub use schema::validate_args;
