pub mod area;
pub mod cohort;
pub mod document;
pub mod program;
pub mod student;

pub use area::Area;
pub use cohort::Cohort;
pub use document::{Document, DocumentType};
pub use program::Program;
pub use student::{Student, StudentStatus};
