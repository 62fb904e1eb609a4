//! Request middleware.

pub mod auth;
pub mod school;

pub use auth::{AuthUser, auth_middleware};
pub use school::school_access;
