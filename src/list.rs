//! The circular list threading the external nodes in sorted order.
//!
//! The sentinel is both ends of the list: its `next` is the first external
//! and its `prev` the last, and on an empty tree both point back at the
//! sentinel. List links never own anything; the tree edges do.

use crate::node::{Arena, Kind, Links, NodeId, HEAD};

impl<K, V> Arena<K, V> {
	pub(crate) fn links(&self, id: NodeId) -> Links {
		match self[id].kind {
			Kind::Head {
				links,
				..
			}
			| Kind::External {
				links,
				..
			} => links,
			Kind::Internal {
				..
			} => unreachable!("internal {:?} is not on the list", id),
		}
	}

	fn links_mut(&mut self, id: NodeId) -> &mut Links {
		match self[id].kind {
			Kind::Head {
				ref mut links,
				..
			}
			| Kind::External {
				ref mut links,
				..
			} => links,
			Kind::Internal {
				..
			} => unreachable!("internal {:?} is not on the list", id),
		}
	}

	#[inline]
	pub(crate) fn first(&self) -> NodeId {
		self.links(HEAD).next
	}

	#[inline]
	pub(crate) fn last(&self) -> NodeId {
		self.links(HEAD).prev
	}

	#[inline]
	pub(crate) fn next(&self, id: NodeId) -> NodeId {
		self.links(id).next
	}

	#[inline]
	pub(crate) fn prev(&self, id: NodeId) -> NodeId {
		self.links(id).prev
	}

	/// Splices the detached external `node` into the list just before
	/// `anchor`. With the sentinel as anchor the node becomes the new last.
	pub(crate) fn link_before(&mut self, anchor: NodeId, node: NodeId) {
		let prev = self.prev(anchor);
		*self.links_mut(node) = Links {
			prev,
			next: anchor,
		};
		self.links_mut(prev).next = node;
		self.links_mut(anchor).prev = node;
	}

	/// Removes `node` from the list and returns the neighbours it had.
	pub(crate) fn unlink(&mut self, node: NodeId) -> Links {
		debug_assert_ne!(node, HEAD, "the sentinel cannot be unlinked");
		let links = self.links(node);
		self.links_mut(links.prev).next = links.next;
		self.links_mut(links.next).prev = links.prev;
		*self.links_mut(node) = Links::detached();
		links
	}
}

#[cfg(test)]
mod tests {
	use crate::node::{Arena, Node, HEAD};

	fn keys(arena: &Arena<i32, ()>) -> Vec<i32> {
		let mut out = Vec::new();
		let mut cur = arena.first();
		while cur != HEAD {
			out.push(*arena.key(cur));
			cur = arena.next(cur);
		}
		out
	}

	#[test]
	fn empty_list_loops_through_sentinel() {
		let arena: Arena<i32, ()> = Arena::with_capacity(0);
		assert_eq!(arena.first(), HEAD);
		assert_eq!(arena.last(), HEAD);
		assert_eq!(arena.next(HEAD), HEAD);
		assert_eq!(arena.prev(HEAD), HEAD);
	}

	#[test]
	fn link_and_unlink() {
		let mut arena: Arena<i32, ()> = Arena::with_capacity(3);
		let b = arena.alloc(Node::external(2, ()));
		arena.link_before(HEAD, b);
		let c = arena.alloc(Node::external(3, ()));
		arena.link_before(HEAD, c);
		let a = arena.alloc(Node::external(1, ()));
		arena.link_before(b, a);
		assert_eq!(keys(&arena), vec![1, 2, 3]);
		assert_eq!(arena.first(), a);
		assert_eq!(arena.last(), c);

		let links = arena.unlink(b);
		assert_eq!(links.prev, a);
		assert_eq!(links.next, c);
		assert_eq!(keys(&arena), vec![1, 3]);
		assert_eq!(arena.prev(c), a);

		arena.unlink(a);
		arena.unlink(c);
		assert_eq!(arena.first(), HEAD);
		assert_eq!(arena.last(), HEAD);
	}
}
