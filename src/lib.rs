pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod evaluation;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod strategy;
pub mod types;

pub use error::GateError;
pub use strategy::{SelectionStrategy, derive_strategy, select_model};
