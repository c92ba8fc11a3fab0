mod clock_manual;
mod credential_store_memory;
mod token_blacklist_memory;

pub use clock_manual::*;
pub use credential_store_memory::*;
pub use token_blacklist_memory::*;
