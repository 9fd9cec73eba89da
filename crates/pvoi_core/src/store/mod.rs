//! Player storage
//!
//! Canonical home of player records. Other components hold [`PlayerId`]s
//! only and look records up here; nothing outside this module mutates a
//! record in place.

mod record;
mod table;

pub use record::{stat_keys, PlayerId, PlayerRecord, Position};
pub use table::PlayerStore;

#[cfg(test)]
mod proptests;
