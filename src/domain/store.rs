//! Store and transaction traits
//!
//! Every request runs its reads and writes inside one [`Transaction`].
//! Writes become visible only after [`Transaction::commit`]; dropping an
//! uncommitted transaction discards them.

use std::fmt::Debug;

use async_trait::async_trait;

use super::member::MemberRepository;
use super::membership::MembershipRepository;
use super::project::ProjectRepository;
use super::team::TeamRepository;
use super::DomainError;

/// A unit of work spanning every table
#[async_trait]
pub trait Transaction:
    TeamRepository + MemberRepository + ProjectRepository + MembershipRepository + Send
{
    /// Make every write of this transaction durable and release it
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// A backend able to open transactions
#[async_trait]
pub trait Store: Send + Sync + Debug {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}
