//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Credential verification for admin and regular logins
//! - `users` - Account management (list, add, change password, delete)

pub mod auth;
pub mod users;

pub use auth::{AuthError, Authenticated, Authenticator};
pub use users::{UserError, UserService, UserSummary};
