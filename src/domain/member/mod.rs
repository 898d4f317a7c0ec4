//! Member domain module
//!
//! A member belongs to one team and joins projects through membership rows.

mod entity;
mod repository;
mod validation;

pub use entity::{Location, Member, MemberChanges, MemberId, NewMember};
pub use repository::MemberRepository;
pub use validation::validate_member_names;
