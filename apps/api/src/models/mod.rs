pub mod ad;
pub mod job_match;
pub mod profile;
pub mod skill;
