//! Core library for TaskFlow
//!
//! This crate contains the core business logic, including:
//! - The record store boundary and its local/remote backends
//! - Task and project data access
//! - The derived task view (filtering, search, sorting, statistics)
//! - Form submission and the application state container

pub mod board;
pub mod config;
pub mod error;
pub mod form;
pub mod prefs;
pub mod project;
pub mod record;
pub mod task;
pub mod view;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
