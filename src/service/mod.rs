//! Shortening and resolution services
//!
//! These sit between the HTTP handlers and the two stores. They own no
//! mutable state; every collaborator is shared behind an `Arc`.

pub mod clicks;
pub mod error;
pub mod resolver;
pub mod shortener;

pub use clicks::ClickAccountant;
pub use error::ServiceError;
pub use resolver::ResolutionService;
pub use shortener::{DuplicatePolicy, ShorteningService};
