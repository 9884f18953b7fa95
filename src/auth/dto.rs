use serde::{Deserialize, Serialize};

/// Request body for signup.
///
/// Fields default to empty strings so a missing field is reported as a 400
/// validation error instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Plain acknowledgement returned by signup.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Returned on successful login. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub name: String,
    pub email: String,
}
