//! In-memory repositories - the fallback when no database is configured.

mod store;

pub use store::InMemoryStore;

#[cfg(test)]
mod tests;
