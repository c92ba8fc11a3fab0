// store

mod token_blacklist;

pub use token_blacklist::*;

// repo

mod credential_store;

pub use credential_store::*;

// time

mod clock;

pub use clock::*;
