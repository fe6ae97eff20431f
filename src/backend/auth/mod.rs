//! Authentication Module
//!
//! Accounts, session tokens and the signup flow.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - JWT creation and verification
//! ├── verification.rs - Pending signups, codes, signup cookie
//! ├── mail.rs         - Mailer trait, SMTP and logging mailers
//! ├── recaptcha.rs    - reCAPTCHA siteverify client
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: email + password → code mailed, `signup-id` cookie set
//! 2. **Verify**: cookie + code → user created → token returned
//! 3. **Login**: email + password → token returned
//! 4. **Me**: token → user info
//!
//! Tokens are accepted from the `Authorization: Bearer` header or, for
//! browser WebSocket clients, from a `token` query parameter.

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// Signup verification codes
pub mod verification;

/// Outgoing mail
pub mod mail;

/// reCAPTCHA verification
pub mod recaptcha;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::{get_me, login, signup, verify_signup};
pub use sessions::{Claims, SessionKeys};
