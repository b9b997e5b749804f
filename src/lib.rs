//! Auth and user-management backend: Argon2 password hashing, HMAC-signed
//! JWTs and a small user CRUD surface over a pluggable credential store.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod users;

pub use error::ApiError;
pub use state::AppState;
