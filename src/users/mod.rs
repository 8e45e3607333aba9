pub mod memory;
pub mod repo;
pub mod repo_types;

pub use memory::InMemoryUserStore;
pub use repo::{StoreError, UserStore};
