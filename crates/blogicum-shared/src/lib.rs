//! # Blogicum Shared
//!
//! Request and response types of the Blogicum HTTP API, shared by the server
//! and any Rust client.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, PageResponse};
