pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod focus;
pub mod pipeline;
pub mod resource;
pub mod routes;
pub mod state;
pub mod types;
