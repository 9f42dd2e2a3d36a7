//! Domain types and DTOs

pub mod profiles;

pub use profiles::{ImageUpload, Profile, ProfileFields, ProfileForm};
