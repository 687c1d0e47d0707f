mod address_parser;
mod keyed_locks;

pub use address_parser::parse_street_address;
pub use keyed_locks::{KeyedLockGuard, KeyedLocks};
