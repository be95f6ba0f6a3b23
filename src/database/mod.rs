pub mod memory_store;
pub mod pg_store;
pub mod pool;
pub mod posting_store;

pub use memory_store::MemoryPostingStore;
pub use pg_store::PgPostingStore;
pub use posting_store::{ActivationOutcome, PostingStore};
