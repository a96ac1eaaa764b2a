//! Snapshot history, time-reversal navigation, and the persisted-state
//! codec.
//!
//! [`HistoryManager`] keeps a bounded buffer of full-grid snapshots and
//! a cursor deciding whether reads are served from the live grid or
//! from a snapshot. The [`codec`] module serializes grids to a
//! versioned binary stream for persistence.

pub mod codec;
pub mod error;
pub mod manager;

pub use codec::{decode_grid, encode_grid, FORMAT_VERSION, MAGIC};
pub use error::{CodecError, HistoryError};
pub use manager::{Cursor, HistoryManager, Snapshot};
