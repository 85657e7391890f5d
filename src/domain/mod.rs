//! Domain layer for Tighten
//!
//! Architecture: Domain Model - pure decision vocabulary for modifier tightening
//! - Decisions, scopes, events and errors independent of any host compiler
//! - Name value types expressing the canonical-identity rules for annotations
//! - No file systems, no terminals, no serialization formats beyond derives

pub mod decision;
pub mod names;

// Re-export main domain types for convenience
pub use decision::*;
pub use names::*;
