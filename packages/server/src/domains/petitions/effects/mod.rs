pub mod duplicates;
pub mod eligibility;
pub mod resolution;

pub use eligibility::{check_eligibility, EligibilityReport};
pub use resolution::{
    aggregate_status, execute_approval, execute_rejection, storage_prefix, ResolutionReport,
};
