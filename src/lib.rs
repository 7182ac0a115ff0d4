// src/lib.rs

pub mod attempt;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

// Re-exported for main.rs and the integration tests
pub use routes::create_router;
