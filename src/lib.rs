pub mod app;
pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod store;
pub mod token;
