pub mod petition;
pub mod signature;

pub use petition::{NewPetition, Petition, PetitionStatus};
pub use signature::{Signature, SignatureStatus};
