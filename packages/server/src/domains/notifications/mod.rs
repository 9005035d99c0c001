//! Notifications raised by the petition workflow. Write-only here; the inbox
//! that renders them lives in the surrounding application.

pub mod models;
