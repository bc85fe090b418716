//! Web API module for Post Box.
//!
//! A JSON API over HTTP. Sessions are carried in a cookie; every other piece
//! of state lives in the identity and letter stores.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
