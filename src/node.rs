//! Node storage: an index-addressed arena of tree nodes.
//!
//! Every relation in the tree (parent, children, list neighbours, routing
//! links) is a [`NodeId`] into one [`Slab`]. Slot 0 is the sentinel, inserted
//! first and never released. Slots freed by deletion are handed straight
//! back to the next insertion.

use std::fmt;
use std::ops::{Index, IndexMut};

use slab::Slab;

use crate::error::{Error, Result};

/// The largest number of slots an arena can address, sentinel included.
pub(crate) const MAX_SLOTS: usize = u32::MAX as usize;

/// Index of the sentinel slot.
pub(crate) const HEAD: NodeId = NodeId(0);

/// Index of a slot in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
	#[inline]
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Debug for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if *self == HEAD {
			f.write_str("#head")
		} else {
			write!(f, "#{}", self.0)
		}
	}
}

/// Node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
	Red,
	Black,
}

/// Which child of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
	Left,
	Right,
}

impl Side {
	#[inline]
	pub(crate) fn opposite(self) -> Side {
		match self {
			Side::Left => Side::Right,
			Side::Right => Side::Left,
		}
	}

	#[inline]
	fn slot(self) -> usize {
		match self {
			Side::Left => 0,
			Side::Right => 1,
		}
	}
}

/// Neighbour links in the circular external-node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links {
	pub(crate) prev: NodeId,
	pub(crate) next: NodeId,
}

impl Links {
	pub(crate) fn detached() -> Links {
		Links {
			prev: HEAD,
			next: HEAD,
		}
	}
}

/// What a slot holds.
pub(crate) enum Kind<K, V> {
	/// The sentinel: root link plus the list's first (`next`) and last
	/// (`prev`) externals.
	Head {
		root: NodeId,
		links: Links,
	},
	/// Pure structure. `lext` names the last external of the left subtree.
	Internal {
		children: [NodeId; 2],
		lext: NodeId,
	},
	/// A payload-carrying leaf, threaded into the list.
	External {
		key: K,
		value: V,
		links: Links,
	},
}

pub(crate) struct Node<K, V> {
	pub(crate) color: Color,
	pub(crate) parent: NodeId,
	pub(crate) kind: Kind<K, V>,
}

impl<K, V> Node<K, V> {
	pub(crate) fn head() -> Node<K, V> {
		Node {
			color: Color::Black,
			parent: HEAD,
			kind: Kind::Head {
				root: HEAD,
				links: Links::detached(),
			},
		}
	}

	pub(crate) fn external(key: K, value: V) -> Node<K, V> {
		Node {
			color: Color::Black,
			parent: HEAD,
			kind: Kind::External {
				key,
				value,
				links: Links::detached(),
			},
		}
	}

	pub(crate) fn internal(parent: NodeId, left: NodeId, right: NodeId) -> Node<K, V> {
		Node {
			color: Color::Red,
			parent,
			kind: Kind::Internal {
				children: [left, right],
				lext: left,
			},
		}
	}
}

/// A stable reference to a node of a [`Tree`](crate::Tree).
///
/// Handles are returned by lookups, insertions and traversal. A handle is
/// either the tree's sentinel (see [`Handle::is_sentinel`]) or names an
/// external node holding a key and value. [`Tree::delete`](crate::Tree::delete)
/// consumes the handle it is given.
///
/// Using a handle after its node was deleted, or with a tree other than the
/// one that produced it, violates the tree's preconditions. Debug builds
/// catch most such uses through a per-slot generation counter.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle {
	index: u32,
	generation: u32,
}

impl Handle {
	/// Returns true if this is the sentinel: the "not found" and
	/// "past the end" marker.
	#[inline]
	pub fn is_sentinel(&self) -> bool {
		self.index == 0
	}
}

/// Slot storage for one tree.
pub(crate) struct Arena<K, V> {
	slots: Slab<Node<K, V>>,
	/// Generation of every slot index handed out so far, bumped on release.
	generations: Vec<u32>,
	/// Most slots the arena may hold, sentinel included.
	limit: usize,
}

impl<K, V> Arena<K, V> {
	pub(crate) fn with_capacity(capacity: usize) -> Arena<K, V> {
		let mut slots = Slab::with_capacity(capacity.saturating_add(1));
		let head = slots.insert(Node::head());
		debug_assert_eq!(head, HEAD.index());
		Arena {
			slots,
			generations: vec![0],
			limit: MAX_SLOTS,
		}
	}

	/// Lowers the slot limit so capacity failures can be reached in tests.
	#[cfg(test)]
	pub(crate) fn set_limit(&mut self, limit: usize) {
		self.limit = limit;
	}

	/// Number of occupied slots, sentinel included.
	#[inline]
	pub(crate) fn live(&self) -> usize {
		self.slots.len()
	}

	/// Ensures the next `additional` calls to [`Arena::alloc`] stay within
	/// the slot limit and do not reallocate.
	pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
		if self.slots.len().saturating_add(additional) > self.limit {
			return Err(Error::CapacityExhausted {
				capacity: self.limit,
			});
		}
		self.slots.reserve(additional);
		Ok(())
	}

	/// Stores `node` in a vacant slot, growing the arena if none is free.
	pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeId {
		let index = self.slots.insert(node);
		debug_assert!(index < MAX_SLOTS);
		if index >= self.generations.len() {
			self.generations.resize(index + 1, 0);
		}
		NodeId(index as u32)
	}

	/// Vacates a slot and returns the node it held. Handles to the slot go
	/// stale.
	pub(crate) fn release(&mut self, id: NodeId) -> Node<K, V> {
		debug_assert_ne!(id, HEAD, "the sentinel is never released");
		match self.slots.try_remove(id.index()) {
			Some(node) => {
				let generation = &mut self.generations[id.index()];
				*generation = generation.wrapping_add(1);
				node
			}
			None => panic!("node {:?} released twice", id),
		}
	}

	/// Drops every node except the sentinel, which is reset to empty.
	///
	/// Generations survive so handles from before the reset stay stale.
	pub(crate) fn reset(&mut self) {
		for generation in self.generations.iter_mut().skip(1) {
			*generation = generation.wrapping_add(1);
		}
		self.slots.clear();
		let head = self.slots.insert(Node::head());
		debug_assert_eq!(head, HEAD.index());
	}

	#[inline]
	pub(crate) fn handle(&self, id: NodeId) -> Handle {
		Handle {
			index: id.0,
			generation: self.generations[id.index()],
		}
	}

	#[inline]
	pub(crate) fn resolve(&self, handle: &Handle) -> NodeId {
		let id = NodeId(handle.index);
		debug_assert!(
			self.generations.get(id.index()) == Some(&handle.generation),
			"stale or foreign handle {:?}",
			handle
		);
		debug_assert!(self.slots.contains(id.index()), "handle {:?} names a released node", handle);
		id
	}

	// -----------------------------------------------------------------------
	// Field access
	// -----------------------------------------------------------------------

	#[inline]
	pub(crate) fn parent(&self, id: NodeId) -> NodeId {
		self[id].parent
	}

	#[inline]
	pub(crate) fn set_parent(&mut self, id: NodeId, parent: NodeId) {
		self[id].parent = parent;
	}

	#[inline]
	pub(crate) fn color(&self, id: NodeId) -> Color {
		self[id].color
	}

	#[inline]
	pub(crate) fn set_color(&mut self, id: NodeId, color: Color) {
		debug_assert!(color == Color::Black || self.is_internal(id), "only internal nodes turn red");
		self[id].color = color;
	}

	#[inline]
	pub(crate) fn is_red(&self, id: NodeId) -> bool {
		self[id].color == Color::Red
	}

	#[inline]
	pub(crate) fn is_internal(&self, id: NodeId) -> bool {
		matches!(self[id].kind, Kind::Internal { .. })
	}

	#[inline]
	pub(crate) fn is_external(&self, id: NodeId) -> bool {
		matches!(self[id].kind, Kind::External { .. })
	}

	pub(crate) fn root(&self) -> NodeId {
		match self[HEAD].kind {
			Kind::Head {
				root,
				..
			} => root,
			_ => unreachable!("slot 0 is always the sentinel"),
		}
	}

	pub(crate) fn child(&self, id: NodeId, side: Side) -> NodeId {
		match self[id].kind {
			Kind::Internal {
				children,
				..
			} => children[side.slot()],
			_ => unreachable!("{:?} has no children", id),
		}
	}

	pub(crate) fn set_child(&mut self, id: NodeId, side: Side, child: NodeId) {
		match self[id].kind {
			Kind::Internal {
				ref mut children,
				..
			} => children[side.slot()] = child,
			_ => unreachable!("{:?} has no children", id),
		}
	}

	/// Which side of internal node `parent` holds `child`.
	pub(crate) fn side_of(&self, parent: NodeId, child: NodeId) -> Side {
		if self.child(parent, Side::Left) == child {
			Side::Left
		} else {
			debug_assert_eq!(self.child(parent, Side::Right), child);
			Side::Right
		}
	}

	/// Points the slot that holds `old` under `parent` at `new` instead.
	/// `parent` may be the sentinel, in which case the root is replaced.
	pub(crate) fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
		match self[parent].kind {
			Kind::Head {
				ref mut root,
				..
			} => {
				debug_assert_eq!(*root, old);
				*root = new;
			}
			Kind::Internal {
				ref mut children,
				..
			} => {
				if children[0] == old {
					children[0] = new;
				} else {
					debug_assert_eq!(children[1], old);
					children[1] = new;
				}
			}
			Kind::External {
				..
			} => unreachable!("external {:?} has no children", parent),
		}
	}

	pub(crate) fn lext(&self, id: NodeId) -> NodeId {
		match self[id].kind {
			Kind::Internal {
				lext,
				..
			} => lext,
			_ => unreachable!("{:?} has no routing link", id),
		}
	}

	pub(crate) fn set_lext(&mut self, id: NodeId, external: NodeId) {
		match self[id].kind {
			Kind::Internal {
				ref mut lext,
				..
			} => *lext = external,
			_ => unreachable!("{:?} has no routing link", id),
		}
	}

	/// The key of an external node.
	pub(crate) fn key(&self, id: NodeId) -> &K {
		match self[id].kind {
			Kind::External {
				ref key,
				..
			} => key,
			_ => unreachable!("{:?} holds no key", id),
		}
	}

	/// The key and value of `id`, or `None` for the sentinel and internal nodes.
	pub(crate) fn payload(&self, id: NodeId) -> Option<(&K, &V)> {
		match self[id].kind {
			Kind::External {
				ref key,
				ref value,
				..
			} => Some((key, value)),
			_ => None,
		}
	}

	pub(crate) fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
		match self[id].kind {
			Kind::External {
				ref mut value,
				..
			} => Some(value),
			_ => None,
		}
	}
}

impl<K, V> Index<NodeId> for Arena<K, V> {
	type Output = Node<K, V>;

	#[inline]
	fn index(&self, id: NodeId) -> &Node<K, V> {
		match self.slots.get(id.index()) {
			Some(node) => node,
			None => panic!("access to released node {:?}", id),
		}
	}
}

impl<K, V> IndexMut<NodeId> for Arena<K, V> {
	#[inline]
	fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
		match self.slots.get_mut(id.index()) {
			Some(node) => node,
			None => panic!("access to released node {:?}", id),
		}
	}
}
