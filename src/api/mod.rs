//! API layer - HTTP endpoints, format negotiation and middleware

pub mod flash;
pub mod health;
pub mod html;
pub mod members;
pub mod middleware;
pub mod negotiation;
pub mod projects;
pub mod router;
pub mod state;
pub mod teams;
pub mod types;
pub mod views;

pub use negotiation::{Negotiation, OutputFormat};
pub use router::create_router;
pub use state::AppState;
