//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and the embedded schema
//! - SQLite pragma configuration
//! - Repository layer with serialized write transactions

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
