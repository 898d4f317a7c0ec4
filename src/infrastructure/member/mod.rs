//! Member infrastructure implementations

mod service;

pub use service::{MemberService, TeamChoice};
