//! Iterators over a [`Tree`](crate::Tree), following the external-node list.
//!
//! Both ends move by one list link per step, so a full pass is O(n) with no
//! tree descent at all.
use std::iter::FusedIterator;

use crate::node::{Arena, Kind, NodeId};

/// Borrowing iterator over the entries of a tree in list order.
///
/// Created by [`Tree::iter`](crate::Tree::iter).
pub struct Iter<'t, K, V> {
	arena: &'t Arena<K, V>,
	front: NodeId,
	back: NodeId,
	remaining: usize,
}

impl<'t, K, V> Iter<'t, K, V> {
	pub(crate) fn new(arena: &'t Arena<K, V>, len: usize) -> Iter<'t, K, V> {
		Iter {
			arena,
			front: arena.first(),
			back: arena.last(),
			remaining: len,
		}
	}
}

impl<K, V> Clone for Iter<'_, K, V> {
	fn clone(&self) -> Self {
		Iter {
			arena: self.arena,
			front: self.front,
			back: self.back,
			remaining: self.remaining,
		}
	}
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
	type Item = (&'t K, &'t V);

	fn next(&mut self) -> Option<Self::Item> {
		if self.remaining == 0 {
			return None;
		}
		let id = self.front;
		self.front = self.arena.next(id);
		self.remaining -= 1;
		self.arena.payload(id)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
	fn next_back(&mut self) -> Option<Self::Item> {
		if self.remaining == 0 {
			return None;
		}
		let id = self.back;
		self.back = self.arena.prev(id);
		self.remaining -= 1;
		self.arena.payload(id)
	}
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Owning iterator over the entries of a tree in list order.
///
/// Created by `Tree::into_iter`. Entries not consumed are dropped with the
/// iterator.
pub struct IntoIter<K, V> {
	arena: Arena<K, V>,
	front: NodeId,
	back: NodeId,
	remaining: usize,
}

impl<K, V> IntoIter<K, V> {
	pub(crate) fn new(arena: Arena<K, V>, len: usize) -> IntoIter<K, V> {
		IntoIter {
			front: arena.first(),
			back: arena.last(),
			arena,
			remaining: len,
		}
	}

	/// Moves the payload out of `id`. The list links of its neighbours are
	/// left dangling; the cursors never step back onto a taken node.
	fn take(&mut self, id: NodeId) -> (K, V) {
		match self.arena.release(id).kind {
			Kind::External {
				key,
				value,
				..
			} => (key, value),
			_ => unreachable!("{:?} is not an entry", id),
		}
	}
}

impl<K, V> Iterator for IntoIter<K, V> {
	type Item = (K, V);

	fn next(&mut self) -> Option<(K, V)> {
		if self.remaining == 0 {
			return None;
		}
		let id = self.front;
		self.front = self.arena.next(id);
		self.remaining -= 1;
		Some(self.take(id))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
	fn next_back(&mut self) -> Option<(K, V)> {
		if self.remaining == 0 {
			return None;
		}
		let id = self.back;
		self.back = self.arena.prev(id);
		self.remaining -= 1;
		Some(self.take(id))
	}
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}
