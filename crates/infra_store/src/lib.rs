//! Store infrastructure
//!
//! Adapters implementing the domain store ports: `PgStore` over PostgreSQL
//! via SQLx, and `InMemoryStore` for tests and local runs. Both enforce the
//! same uniqueness and optimistic version semantics.

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use error::DatabaseError;
pub use memory::InMemoryStore;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use postgres::PgStore;
