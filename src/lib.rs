//! gateway-sync - API Gateway to Consul catalog synchronisation
//!
//! Periodically lists AWS API Gateway REST APIs, derives a canonical service
//! identity for each, selects services with tag filters, renders tag templates,
//! and registers each selected API as an external service in Consul.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filtering;
pub mod registration;
pub mod service;
pub mod sync;
pub mod templating;

pub use error::{Result, SyncError};
