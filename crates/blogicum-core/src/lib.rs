//! # Blogicum Core
//!
//! The domain layer of Blogicum: entities, the visibility and ownership
//! rules, pagination, and the use cases built on top of them.
//! This crate has zero infrastructure dependencies.

pub mod access;
pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::BlogService;
