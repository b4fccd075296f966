//! Profiles, ads and the skill catalog: everything the matching core reads.

pub mod ads;
pub mod handlers;
pub mod profiles;
pub mod skills;
