pub mod password;
pub mod service;

pub use password::{hash_password, verify_password};
pub use service::{AuthService, Claims, TokenError, TokenKind};
