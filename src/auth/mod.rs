use axum::Router;

use crate::state::AppState;

pub mod dto;
mod error;
pub mod handlers;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use service::AuthService;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
