// Business domains
pub mod notifications;
pub mod petitions;
pub mod students;
