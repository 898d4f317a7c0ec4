//! Project infrastructure implementations

mod service;

pub use service::{ProjectDetails, ProjectService};
