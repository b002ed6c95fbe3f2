pub mod config;
pub mod handlers;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod utils;

pub use handlers::api_router;
pub use state::AppState;
