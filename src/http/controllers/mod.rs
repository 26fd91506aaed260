pub mod auth;
pub mod base;
pub mod users;

pub use auth::AuthController;
pub use base::{BaseController, ErrorBody};
pub use users::UsersController;
