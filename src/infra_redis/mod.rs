mod token_blacklist_redis;

pub use token_blacklist_redis::*;
