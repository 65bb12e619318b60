//! # Clarifai API Server Library
//!
//! HTTP layer of the Clarifai task tracker.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: environment-based configuration
//! - `error`: error handling and HTTP response mapping
//! - `routes`: route handlers (auth, tasks, files, dashboard, health)

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
