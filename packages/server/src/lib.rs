// University Registrar CRM - Career-Change Petition Core
//
// This crate implements the petition workflow: intake guards, the per-area
// signature ledger and resolver, and the resolution side effects (document
// migration, student placement, notifications). It has no wire protocol of
// its own; the surrounding application calls the actions in
// domains::petitions directly.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
