//! Project module
//!
//! A Project groups tasks under a display name and color.
//! Tasks reference their project by id.

mod model;
mod repository;
mod service;

pub use model::*;
pub use repository::ProjectRepository;
pub use service::{ProjectService, PROJECT_FIELDS, PROJECT_UPDATEABLE_FIELDS};
