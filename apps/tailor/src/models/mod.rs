pub mod candidate;
pub mod profile;

pub use candidate::{Candidate, Critique};
pub use profile::RequirementProfile;
