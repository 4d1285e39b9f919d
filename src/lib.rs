//! fundgate - role hierarchy evaluation and auto-approval gating
//!
//! The two decision points of the crowdfunding platform's backend: whether a
//! caller's role is high enough for a protected action, and the validation
//! boundary in front of the external engine that approves projects,
//! investments, payouts, KYC outcomes, documents and role upgrades.
//! All modules are public for testing.

pub mod approval;
pub mod errors;
pub mod rbac;
pub mod settings;
pub mod web;
