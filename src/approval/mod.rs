//! Auto-approval gate: validates approval requests at the boundary and
//! delegates the verdict to an external decision engine.

pub mod engine;
pub mod errors;
pub mod gate;
pub mod types;
pub mod validate;
pub mod web;

pub use gate::ApprovalGate;
