//! # rblist: A Red-Black Tree Threaded With a Sorted List
//!
//! This crate provides a red-black tree that keeps every key/value pair in an
//! **external** (leaf) node and threads those external nodes into a circular
//! doubly-linked list in key order. Lookups, insertions and deletions take
//! O(log n); stepping to the next or previous entry from any node takes O(1).
//!
//! ## Design Overview
//!
//! **Internal and external nodes**: internal nodes carry only structure (a
//! color, a parent, two children, and a routing link to the last external
//! node of their left subtree). External nodes carry the payload and their
//! list neighbours. Every insertion turns one leaf into a red internal node
//! with two leaves below it; every deletion collapses one internal node.
//!
//! **The sentinel**: each tree has one sentinel node. It anchors the root and
//! is both ends of the list, so `next` of the last entry and `prev` of the
//! first are the sentinel. Lookups that find nothing return it too; check
//! with [`Handle::is_sentinel`].
//!
//! **Arena storage**: nodes live in a single `slab::Slab` and refer to each other by
//! index, so parent pointers and list links need no reference counting.
//! Slots freed by deletion are reused by the next insertion.
//!
//! ```text
//!                 ┌──────────┐
//!        ┌───────►│ sentinel │◄──────────────────────┐
//!        │        └────┬─────┘                       │
//!        │             │ root                        │
//!        │             ▼                             │
//!        │         ┌───────┐                         │
//!        │         │ int B │                         │
//!        │         └───┬───┘                         │
//!        │        ┌────┴──────┐                      │
//!        │        ▼           ▼                      │
//!        │     ┌──────┐   ┌───────┐                  │
//!        │     │ "a"  │   │ int R │                  │
//!        │     └──────┘   └───┬───┘                  │
//!        │                ┌───┴───┐                  │
//!        │                ▼       ▼                  │
//!        │            ┌──────┐ ┌──────┐              │
//!        │            │ "b"  │ │ "c"  │              │
//!        │            └──────┘ └──────┘              │
//!        │                                           │
//!        └── next ── "a" ⇄ "b" ⇄ "c" ── next ────────┘
//! ```
//!
//! ## Basic Usage
//!
//! ```
//! use rblist::StrTree;
//!
//! let mut tree = StrTree::new();
//! tree.insert("pear".to_string(), 3).unwrap();
//! tree.insert("apple".to_string(), 1).unwrap();
//! tree.insert("melon".to_string(), 2).unwrap();
//!
//! // Ceiling lookups return the first entry not less than the key.
//! let (node, found) = tree.find_ceiling_with_flag("banana");
//! assert!(!found);
//! assert_eq!(tree.key(&node).map(String::as_str), Some("melon"));
//!
//! // Neighbours are one link away.
//! let next = tree.next(&node);
//! assert_eq!(tree.value(&next), Some(&3));
//! assert!(tree.next(&next).is_sentinel());
//!
//! // Deleting consumes the handle and hands back the payload.
//! let (key, value) = tree.delete(node);
//! assert_eq!((key.as_str(), value), ("melon", 2));
//! assert_eq!(tree.len(), 2);
//! ```
//!
//! ## Thread Safety
//!
//! The tree has no internal synchronization. Reads borrow it shared and
//! writes borrow it exclusively, so sharing across threads is up to the
//! caller (for example behind a `RwLock`).

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use log::debug;

mod balance;
pub mod compare;
pub mod error;
pub mod iter;
mod list;
mod node;
#[cfg(any(test, feature = "test-utils"))]
pub mod util;

pub use compare::{ByteOrder, Comparator, FnOrder, NaturalOrder, SignOrder};
pub use error::{Error, Result};
pub use iter::{IntoIter, Iter};
pub use node::Handle;

use node::{Arena, Kind, NodeId, HEAD};

// ---------------------------------------------------------------------------
// Public Type Aliases
// ---------------------------------------------------------------------------

/// A tree keyed by strings, ordered by their bytes.
pub type StrTree<V> = Tree<String, V, ByteOrder>;

/// A tree keyed by signed integers.
pub type IntTree<V> = Tree<i64, V, NaturalOrder>;

/// A tree ordered by a caller-supplied comparison function.
pub type FnTree<K, V, F> = Tree<K, V, FnOrder<F>>;

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// A red-black tree whose entries are threaded into a sorted list.
///
/// # Type Parameters
///
/// - `K`: The key type.
/// - `V`: The value type.
/// - `C`: The ordering, a [`Comparator`] over `K`. Defaults to
///   [`NaturalOrder`]; see [`StrTree`], [`IntTree`] and [`FnTree`].
///
/// Entries are addressed through [`Handle`]s. Duplicate keys are allowed;
/// [`Tree::insert`] places a new entry before existing equal ones.
pub struct Tree<K, V, C = NaturalOrder> {
	/// Node storage. Slot 0 is the sentinel.
	arena: Arena<K, V>,
	/// Number of external nodes.
	len: usize,
	cmp: C,
}

impl<K, V, C: Default> Default for Tree<K, V, C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V, C: Default> Tree<K, V, C> {
	/// Creates an empty tree using the comparator's default value.
	///
	/// ```
	/// use rblist::IntTree;
	///
	/// let tree: IntTree<&str> = IntTree::new();
	/// assert!(tree.is_empty());
	/// assert!(tree.first().is_sentinel());
	/// ```
	pub fn new() -> Self {
		Self::with_comparator(C::default())
	}

	/// Creates an empty tree with room for `capacity` entries before the
	/// node arena reallocates.
	pub fn with_capacity(capacity: usize) -> Self {
		Self::with_capacity_and_comparator(capacity, C::default())
	}
}

impl<K, V, C> Tree<K, V, C> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty tree ordered by `cmp`.
	pub fn with_comparator(cmp: C) -> Self {
		Self::with_capacity_and_comparator(0, cmp)
	}

	/// Creates an empty tree ordered by `cmp` with room for `capacity`
	/// entries.
	pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
		// n entries need n externals and n - 1 internals.
		Tree {
			arena: Arena::with_capacity(capacity.saturating_mul(2)),
			len: 0,
			cmp,
		}
	}

	/// Returns the tree's comparator.
	pub fn comparator(&self) -> &C {
		&self.cmp
	}

	// -----------------------------------------------------------------------
	// Tree Metadata
	// -----------------------------------------------------------------------

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns true if the tree holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	// -----------------------------------------------------------------------
	// List Traversal
	// -----------------------------------------------------------------------

	/// Returns the sentinel handle.
	pub fn sentinel(&self) -> Handle {
		self.arena.handle(HEAD)
	}

	/// Returns the entry with the smallest key, or the sentinel if the tree
	/// is empty.
	pub fn first(&self) -> Handle {
		self.arena.handle(self.arena.first())
	}

	/// Returns the entry with the largest key, or the sentinel if the tree
	/// is empty.
	pub fn last(&self) -> Handle {
		self.arena.handle(self.arena.last())
	}

	/// Returns the entry after `node` in list order. The successor of the
	/// last entry is the sentinel; the successor of the sentinel is the
	/// first entry.
	pub fn next(&self, node: &Handle) -> Handle {
		let id = self.arena.resolve(node);
		self.arena.handle(self.arena.next(id))
	}

	/// Returns the entry before `node` in list order. The predecessor of the
	/// first entry is the sentinel; the predecessor of the sentinel is the
	/// last entry.
	pub fn prev(&self, node: &Handle) -> Handle {
		let id = self.arena.resolve(node);
		self.arena.handle(self.arena.prev(id))
	}

	// -----------------------------------------------------------------------
	// Entry Access
	// -----------------------------------------------------------------------

	/// Returns the key stored at `node`, or `None` for the sentinel.
	pub fn key(&self, node: &Handle) -> Option<&K> {
		self.entry(node).map(|(k, _)| k)
	}

	/// Returns the value stored at `node`, or `None` for the sentinel.
	pub fn value(&self, node: &Handle) -> Option<&V> {
		self.entry(node).map(|(_, v)| v)
	}

	/// Returns a mutable reference to the value stored at `node`, or `None`
	/// for the sentinel. Keys cannot be changed in place.
	pub fn value_mut(&mut self, node: &Handle) -> Option<&mut V> {
		let id = self.arena.resolve(node);
		self.arena.value_mut(id)
	}

	/// Returns the key and value stored at `node`, or `None` for the
	/// sentinel.
	pub fn entry(&self, node: &Handle) -> Option<(&K, &V)> {
		let id = self.arena.resolve(node);
		self.arena.payload(id)
	}

	/// Returns an iterator over the entries in list order.
	pub fn iter(&self) -> Iter<'_, K, V> {
		Iter::new(&self.arena, self.len)
	}

	// -----------------------------------------------------------------------
	// Unchecked Insertion
	// -----------------------------------------------------------------------

	/// Inserts a new entry immediately before `anchor` in list order and
	/// returns its handle.
	///
	/// With the sentinel as `anchor` the entry is appended after the last
	/// one. The key is **not** compared against its neighbours: placing it
	/// out of order is allowed and leaves the list (and later ceiling
	/// queries) out of order. The red-black shape stays balanced either way.
	///
	/// `anchor` must come from this tree and must not have been deleted.
	///
	/// # Errors
	///
	/// Returns [`Error::CapacityExhausted`] if the node arena has no room
	/// for the two slots a splice needs. The tree is unchanged, and `key`
	/// and `value` are dropped.
	pub fn insert_before(&mut self, anchor: &Handle, key: K, value: V) -> Result<Handle> {
		let anchor = self.arena.resolve(anchor);
		self.splice(anchor, key, value)
	}

	/// Inserts a new entry immediately after `anchor` in list order and
	/// returns its handle.
	///
	/// With the sentinel as `anchor` the entry is prepended before the first
	/// one. As with [`Tree::insert_before`], no ordering check is made.
	///
	/// # Errors
	///
	/// Returns [`Error::CapacityExhausted`] if the node arena has no room
	/// for the two slots a splice needs. The tree is unchanged, and `key`
	/// and `value` are dropped.
	pub fn insert_after(&mut self, anchor: &Handle, key: K, value: V) -> Result<Handle> {
		let anchor = self.arena.resolve(anchor);
		let next = self.arena.next(anchor);
		self.splice(next, key, value)
	}

	fn splice(&mut self, anchor: NodeId, key: K, value: V) -> Result<Handle> {
		debug_assert!(
			anchor == HEAD || self.arena.is_external(anchor),
			"anchor {:?} is not an entry of this tree",
			anchor
		);
		// One external, plus the internal node that replaces the split leaf.
		// Nothing is touched until both slots are secured.
		self.arena.reserve(2)?;
		let (node, internal) = self.arena.split_before(anchor, key, value);
		if let Some(internal) = internal {
			self.arena.insert_fixup(internal);
		}
		self.len += 1;
		Ok(self.arena.handle(node))
	}

	// -----------------------------------------------------------------------
	// Deletion
	// -----------------------------------------------------------------------

	/// Removes the entry at `node` from the tree and the list, releases its
	/// storage and returns its key and value.
	///
	/// The handle is consumed. Other handles to the same entry must not be
	/// used afterwards.
	///
	/// # Panics
	///
	/// Panics if `node` is the sentinel.
	pub fn delete(&mut self, node: Handle) -> (K, V) {
		assert!(!node.is_sentinel(), "the sentinel cannot be deleted");
		let id = self.arena.resolve(&node);

		// The routing repair in `collapse` reads the list, so the tree edit
		// comes first.
		if let Some(short) = self.arena.collapse(id) {
			self.arena.delete_fixup(short);
		}
		self.arena.unlink(id);
		self.len -= 1;

		match self.arena.release(id).kind {
			Kind::External {
				key,
				value,
				..
			} => (key, value),
			_ => unreachable!("{:?} is not an entry", id),
		}
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		debug!("clearing tree of {} entries", self.len);
		self.arena.reset();
		self.len = 0;
	}

	// -----------------------------------------------------------------------
	// Diagnostics
	// -----------------------------------------------------------------------

	/// Returns the number of black nodes on the path from `node` up to the
	/// root, both included. Every entry of a tree has the same black
	/// height, and no path is more than twice as long as it.
	pub fn black_height(&self, node: &Handle) -> usize {
		let mut cur = self.arena.resolve(node);
		let mut count = 0;
		while cur != HEAD {
			if !self.arena.is_red(cur) {
				count += 1;
			}
			cur = self.arena.parent(cur);
		}
		count
	}

	/// Returns the number of edges between `node` and the root.
	pub fn path_length(&self, node: &Handle) -> usize {
		let mut cur = self.arena.resolve(node);
		let mut count = 0;
		while cur != HEAD && self.arena.parent(cur) != HEAD {
			count += 1;
			cur = self.arena.parent(cur);
		}
		count
	}
}

// ---------------------------------------------------------------------------
// Query Engine and Ordered Insertion
// ---------------------------------------------------------------------------

impl<K, V, C> Tree<K, V, C> {
	/// Descends to the first external whose key is not less than `key`.
	fn ceiling<Q>(&self, key: &Q) -> (NodeId, bool)
	where
		Q: ?Sized,
		K: Borrow<Q>,
		C: Comparator<Q>,
	{
		let last = self.arena.last();
		if last == HEAD || self.cmp.compare(key, self.arena.key(last).borrow()) == Ordering::Greater {
			return (HEAD, false);
		}

		// From here a ceiling exists, and each internal node's routing link
		// tells which side holds it.
		let mut cur = self.arena.root();
		loop {
			match self.arena[cur].kind {
				Kind::Internal {
					children: [left, right],
					lext,
				} => {
					cur = match self.cmp.compare(key, self.arena.key(lext).borrow()) {
						Ordering::Greater => right,
						Ordering::Less | Ordering::Equal => left,
					};
				}
				Kind::External {
					key: ref found,
					..
				} => {
					let exact = self.cmp.compare(key, found.borrow()) == Ordering::Equal;
					return (cur, exact);
				}
				Kind::Head {
					..
				} => unreachable!("sentinel reached below the root"),
			}
		}
	}

	/// Returns the entry whose key equals `key`, or failing that the entry
	/// with the smallest key greater than `key`, or the sentinel if every
	/// key is smaller.
	///
	/// With duplicate keys the first equal entry in list order is returned.
	///
	/// ```
	/// use rblist::IntTree;
	///
	/// let mut tree = IntTree::new();
	/// for k in [10, 20, 30] {
	///     tree.insert(k, ()).unwrap();
	/// }
	/// assert_eq!(tree.key(&tree.find_ceiling(&15)), Some(&20));
	/// assert!(tree.find_ceiling(&31).is_sentinel());
	/// ```
	pub fn find_ceiling<Q>(&self, key: &Q) -> Handle
	where
		Q: ?Sized,
		K: Borrow<Q>,
		C: Comparator<Q>,
	{
		let (id, _) = self.ceiling(key);
		self.arena.handle(id)
	}

	/// Like [`Tree::find_ceiling`], additionally reporting whether the
	/// returned entry's key equals `key`.
	pub fn find_ceiling_with_flag<Q>(&self, key: &Q) -> (Handle, bool)
	where
		Q: ?Sized,
		K: Borrow<Q>,
		C: Comparator<Q>,
	{
		let (id, found) = self.ceiling(key);
		(self.arena.handle(id), found)
	}

	/// Returns the first entry whose key equals `key`.
	pub fn find<Q>(&self, key: &Q) -> Option<Handle>
	where
		Q: ?Sized,
		K: Borrow<Q>,
		C: Comparator<Q>,
	{
		match self.ceiling(key) {
			(id, true) => Some(self.arena.handle(id)),
			(_, false) => None,
		}
	}

	/// Returns true if some entry's key equals `key`.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		Q: ?Sized,
		K: Borrow<Q>,
		C: Comparator<Q>,
	{
		self.ceiling(key).1
	}

	/// Inserts `key` and `value` in key order and returns the new entry's
	/// handle. This is [`Tree::find_ceiling`] followed by
	/// [`Tree::insert_before`].
	///
	/// # Errors
	///
	/// Returns [`Error::CapacityExhausted`] if the node arena has no room
	/// for the two slots a splice needs. The tree is unchanged, and `key`
	/// and `value` are dropped.
	pub fn insert(&mut self, key: K, value: V) -> Result<Handle>
	where
		C: Comparator<K>,
	{
		let (anchor, _) = self.ceiling(&key);
		self.splice(anchor, key, value)
	}

	/// Removes the first entry whose key equals `key` and returns it.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		Q: ?Sized,
		K: Borrow<Q>,
		C: Comparator<Q>,
	{
		let node = self.find(key)?;
		Some(self.delete(node))
	}
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Tree<K, V, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<'t, K, V, C> IntoIterator for &'t Tree<K, V, C> {
	type Item = (&'t K, &'t V);
	type IntoIter = Iter<'t, K, V>;

	fn into_iter(self) -> Iter<'t, K, V> {
		self.iter()
	}
}

impl<K, V, C> IntoIterator for Tree<K, V, C> {
	type Item = (K, V);
	type IntoIter = IntoIter<K, V>;

	fn into_iter(self) -> IntoIter<K, V> {
		IntoIter::new(self.arena, self.len)
	}
}

// ===========================================================================
// Test-Only Validation Module
// ===========================================================================

/// Invariant validation for testing.
#[cfg(any(test, feature = "test-utils"))]
impl<K, V, C> Tree<K, V, C> {
	/// Validates every structural invariant and the key order of the list.
	/// Panics with diagnostic info if any is violated.
	///
	/// # Invariants Checked
	///
	/// 1. Everything [`Tree::assert_structure`] checks
	/// 2. Key order: each entry's key is not less than its predecessor's
	pub fn assert_invariants(&self)
	where
		K: fmt::Debug,
		C: Comparator<K>,
	{
		self.assert_structure();
		let mut prev: Option<&K> = None;
		for (key, _) in self.iter() {
			if let Some(prev) = prev {
				assert!(
					self.cmp.compare(prev, key) != Ordering::Greater,
					"list out of order: {:?} before {:?}",
					prev,
					key
				);
			}
			prev = Some(key);
		}
	}

	/// Validates the tree's shape without comparing keys, so trees built
	/// with out-of-order [`Tree::insert_before`] calls can still be checked.
	///
	/// # Invariants Checked
	///
	/// 1. Sentinel: black, its own parent, parent of the root
	/// 2. Root color: black
	/// 3. Parent links: every child names its parent
	/// 4. No red node has a red child; externals are black
	/// 5. Black height: equal on every path
	/// 6. Routing links: each internal node names the last external of its
	///    left subtree
	/// 7. List order equals in-order order, in both directions
	/// 8. Length and storage: `len` externals, `len - 1` internals, no
	///    leaked slots
	pub fn assert_structure(&self) {
		let head = &self.arena[HEAD];
		assert_eq!(head.parent, HEAD, "sentinel parent must be itself");
		assert!(!self.arena.is_red(HEAD), "sentinel must be black");

		let root = self.arena.root();
		if root == HEAD {
			assert_eq!(self.len, 0, "empty tree reports {} entries", self.len);
			assert_eq!(self.arena.first(), HEAD, "empty list must loop to the sentinel");
			assert_eq!(self.arena.last(), HEAD, "empty list must loop to the sentinel");
			assert_eq!(self.arena.live(), 1, "empty tree still holds node slots");
			return;
		}

		assert_eq!(self.arena.parent(root), HEAD, "root {:?} does not point at the sentinel", root);
		assert!(!self.arena.is_red(root), "root {:?} is red", root);

		let mut leaves = Vec::with_capacity(self.len);
		self.validate_subtree(root, &mut leaves);
		assert_eq!(leaves.len(), self.len, "tree holds {} externals, len is {}", leaves.len(), self.len);

		let mut cur = HEAD;
		for (pos, &leaf) in leaves.iter().enumerate() {
			let next = self.arena.next(cur);
			assert_eq!(next, leaf, "list position {} diverges from in-order position", pos);
			assert_eq!(self.arena.prev(next), cur, "back link of {:?} is broken", next);
			cur = next;
		}
		assert_eq!(self.arena.next(cur), HEAD, "list does not end at the sentinel");
		assert_eq!(self.arena.prev(HEAD), cur, "sentinel back link is not the last entry");

		assert_eq!(
			self.arena.live(),
			2 * self.len,
			"{} live slots for {} entries",
			self.arena.live(),
			self.len
		);
	}

	/// Validates the subtree at `id`, appending its externals in order, and
	/// returns its black height.
	fn validate_subtree(&self, id: NodeId, leaves: &mut Vec<NodeId>) -> usize {
		match self.arena[id].kind {
			Kind::External {
				..
			} => {
				assert!(!self.arena.is_red(id), "external {:?} is red", id);
				leaves.push(id);
				1
			}
			Kind::Internal {
				children: [left, right],
				lext,
			} => {
				for child in [left, right] {
					assert_eq!(self.arena.parent(child), id, "child {:?} does not point at {:?}", child, id);
					assert!(
						!(self.arena.is_red(id) && self.arena.is_red(child)),
						"red node {:?} has a red child {:?}",
						id,
						child
					);
				}

				let left_height = self.validate_subtree(left, leaves);
				assert_eq!(
					leaves.last().copied(),
					Some(lext),
					"routing link of {:?} does not name the last external on its left",
					id
				);
				let right_height = self.validate_subtree(right, leaves);
				assert_eq!(
					left_height, right_height,
					"black heights differ under {:?}: {} left, {} right",
					id, left_height, right_height
				);

				left_height + usize::from(!self.arena.is_red(id))
			}
			Kind::Head {
				..
			} => panic!("sentinel reachable below the root"),
		}
	}
}
