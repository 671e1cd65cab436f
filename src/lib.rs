//! Atelier - client portal and billing backend for a design studio
//!
//! This library provides the core functionality for the Atelier backend:
//! the Stripe invoice synchronization pipeline, database access, and the
//! admin/portal API handlers.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod sync;
