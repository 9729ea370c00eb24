pub mod extractor;
pub mod jwt;
pub mod password;
pub mod pin;
pub mod service;

pub use extractor::AuthUser;
pub use jwt::TokenService;
pub use password::PasswordHasher;
pub use pin::{OsPinSource, PinSource, ResetPins};
pub use service::{AuthService, AuthSuccess, RegisterInput, UserSummary};
