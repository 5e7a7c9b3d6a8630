//! File manager - image gateway between HTTP clients and the metadata service
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod crud;
pub mod error;
pub mod images;
pub mod server;

pub use error::{Error, Result};
