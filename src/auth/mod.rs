pub mod jwt;
pub mod password;

pub use jwt::{AuthTokens, Claims};
pub use password::{hash_password, verify_password};
