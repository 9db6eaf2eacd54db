use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new().nest("/auth", handlers::auth_routes())
}
