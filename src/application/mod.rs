//! Application services orchestrating domain logic and repositories.

pub mod chrome;
pub mod error;
pub mod feed;
pub mod page;
pub mod pagination;
pub mod repos;
