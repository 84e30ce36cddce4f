//! # Error Types for the Threaded Red-Black Tree
//!
//! The tree is a trusted-caller structure: lookups that find nothing return
//! the sentinel handle, and misuse such as deleting a node twice is a
//! documented precondition rather than a runtime error. The only failure
//! that surfaces as a value is running out of addressable node slots; an
//! allocator failure while growing the arena aborts, as it does for any
//! collection.
//!
//! ## Error Flow
//!
//! ```text
//! insert / insert_before / insert_after
//!      │
//!      ▼
//! Reserve arena slots ──────► Err(CapacityExhausted)
//!      │                          (tree left untouched, key and value dropped)
//!      ▼ (Ok)
//! Splice list + tree, run insert-fixup
//!      │
//!      ▼
//! Ok(Handle)
//! ```
//!
//! Every slot an insertion needs is reserved before the first link is
//! rewritten, so an `Err` never leaves a half-spliced node behind.

use thiserror::Error;

/// Errors returned by tree operations that allocate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// The arena already addresses as many slots as a node index can name.
	#[error("node arena is full ({capacity} slots)")]
	CapacityExhausted {
		/// Maximum number of slots, sentinel included.
		capacity: usize,
	},
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
