//! Task module
//!
//! This module contains task-related types and data access.

mod model;
mod repository;
mod service;

pub use model::*;
pub use repository::TaskRepository;
pub use service::{TaskService, TASK_FIELDS, TASK_UPDATEABLE_FIELDS};
