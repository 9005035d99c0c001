//! Students and the reference data around them (programs, cohorts, areas,
//! documents). Read-mostly from the petition workflow's point of view.

pub mod models;
