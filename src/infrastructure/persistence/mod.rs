mod memory_store;
mod pg_pool;
mod pg_store;

pub use memory_store::InMemoryStore;
pub use pg_pool::create_pool;
pub use pg_store::PgStore;
