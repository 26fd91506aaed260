pub mod user;

pub use user::{User, UserParams, UserPatch, ValidationErrors};
