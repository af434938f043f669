//! Durable session storage adapters.

mod dto;
mod file_store;

pub use file_store::FileSessionStore;
