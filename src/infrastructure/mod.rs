//! Infrastructure layer - Store backends, services and observability

pub mod logging;
pub mod member;
pub mod observability;
pub mod project;
pub mod storage;
pub mod team;
