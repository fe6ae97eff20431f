//! Authentication Handlers Module
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── types.rs    - Request and response types
//! ├── signup.rs   - Signup and code verification
//! ├── login.rs    - Email/password login
//! └── me.rs       - Current user
//! ```
//!
//! # Handlers
//!
//! - **`signup`** - POST /api/auth/signup
//! - **`verify_signup`** - POST /api/auth/signup/verify
//! - **`login`** - POST /api/auth/login
//! - **`get_me`** - GET /api/auth/me

/// Request and response types
pub mod types;

pub mod signup;

pub mod login;

pub mod me;

pub use types::{AuthResponse, LoginRequest, SignupRequest, SignupResponse, UserResponse, VerifyRequest};

pub use login::login;
pub use me::get_me;
pub use signup::{signup, verify_signup};
