pub mod auth;
pub mod envelope;
pub mod errors;
pub mod timestamp;
pub mod user;

pub use auth::{AuthPayload, LoginRequest, LoginResponse, RegisterData, RegisterRequest, SignUpData};
pub use envelope::{DecodeError, Envelope, decode};
pub use errors::ErrorResponse;
pub use timestamp::Timestamp;
pub use user::{User, UserRole, UserUpdateData};
