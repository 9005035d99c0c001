//! Career-change petitions - the approval workflow core.
//!
//! Components:
//! - models: Petition and Signature rows, their SQL, and the status enums
//! - errors: the structured error taxonomy surfaced to callers
//! - effects: eligibility check, duplicate guard, resolution executor
//! - actions: `create_petition` / `sign_petition` entry points

pub mod actions;
pub mod effects;
pub mod errors;
pub mod models;

pub use actions::{
    create_petition, sign_petition, CreatePetitionRequest, Decision, SignatureDecisionRequest,
    SignatureOutcome,
};
pub use errors::PetitionError;
