use serde::{Deserialize, Serialize};

/// Login input; absent fields simply fail the credential check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Session probe result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub authenticated: bool,
}
