mod credential_store_pg;

pub use credential_store_pg::*;
