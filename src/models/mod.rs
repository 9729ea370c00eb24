mod password_reset;
mod user;

pub use password_reset::{NewResetRequest, PasswordResetRequest};
pub use user::{NewUser, Role, User};
