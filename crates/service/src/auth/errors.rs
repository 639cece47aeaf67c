use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    Unauthorized,
}
