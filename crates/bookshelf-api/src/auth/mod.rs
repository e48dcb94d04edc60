//! Authentication module
//!
//! - Password hashing with Argon2id
//! - Access and refresh token issuance and verification
//! - Gates that authenticate requests per token class
//! - Register, login, refresh and identity verification flows

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtError, TokenClass, TokenPair, TokenService};
pub use middleware::{access_gate, refresh_gate, AuthError, AuthGate};
pub use models::{Identity, User, UserResponse};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
