//! Infrastructure Layer
//!
//! Database, in-memory and filesystem implementations of the domain traits.

pub mod image_store;
pub mod memory;
pub mod postgres;

pub use image_store::LocalImageStore;
pub use memory::InMemoryAccountRepository;
pub use postgres::PgAccountRepository;
