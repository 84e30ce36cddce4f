//! Structural edits and red-black rebalancing.
//!
//! The tree grows one leaf at a time: inserting next to an external node
//! replaces that leaf with a red internal node whose two children are the old
//! leaf and the new one. Deleting collapses the leaf's parent, letting the
//! sibling subtree take its slot. Externals are always black, so black-height
//! only ever changes through internal nodes.
//!
//! Both fixups are written as a classification step returning one of a small
//! set of canonical cases followed by a `match` that applies it. Every case
//! has a mirror image; [`Side`] carries the orientation so each is written
//! once.

use log::trace;

use crate::node::{Arena, Color, Node, NodeId, Side, HEAD};

/// Cases of the insert-fixup walk, classified at a red node `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertCase {
	/// `n` is the root: paint it black and stop.
	Root,
	/// `n`'s parent is black: nothing to repair.
	BlackParent,
	/// Parent and uncle both red: push the red up to the grandparent.
	RedUncle {
		parent: NodeId,
		uncle: NodeId,
		grandparent: NodeId,
	},
	/// `n` hangs on the opposite side of its parent from the parent's own
	/// side: rotate it above its parent to reach the outer case.
	InnerChild {
		parent: NodeId,
		side: Side,
	},
	/// `n` and its parent lean the same way: rotate the grandparent.
	OuterChild {
		parent: NodeId,
		grandparent: NodeId,
		side: Side,
	},
}

/// Cases of the delete-fixup walk, classified at a node `x` whose subtree is
/// one black short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteCase {
	/// `x` is red or the root: painting it black settles the deficit.
	Absorb,
	/// Red sibling: rotate it above the parent so `x` gets a black sibling.
	RedSibling {
		parent: NodeId,
		sibling: NodeId,
		side: Side,
	},
	/// Black sibling with two black children: redden it and move the deficit
	/// up to the parent.
	BlackNephews {
		parent: NodeId,
		sibling: NodeId,
	},
	/// Black sibling whose only red child is the one nearer `x`: rotate the
	/// sibling to make the far child red.
	NearNephewRed {
		sibling: NodeId,
		nephew: NodeId,
		side: Side,
	},
	/// Black sibling with a red child on the far side: one rotation at the
	/// parent finishes the repair.
	FarNephewRed {
		parent: NodeId,
		sibling: NodeId,
		nephew: NodeId,
		side: Side,
	},
}

impl<K, V> Arena<K, V> {
	// -----------------------------------------------------------------------
	// Rotation
	// -----------------------------------------------------------------------

	/// Rotates around `pivot` toward `dir`: the child on the opposite side
	/// rises into `pivot`'s slot and `pivot` becomes its `dir` child.
	///
	/// Routing links need no update: a rotation keeps the in-order sequence,
	/// and the last external left of each moved node stays the same.
	pub(crate) fn rotate(&mut self, pivot: NodeId, dir: Side) {
		let riser = self.child(pivot, dir.opposite());
		let inner = self.child(riser, dir);
		let parent = self.parent(pivot);
		trace!("rotate {:?} at {:?}, {:?} rises", dir, pivot, riser);

		self.set_child(pivot, dir.opposite(), inner);
		self.set_parent(inner, pivot);

		self.replace_child(parent, pivot, riser);
		self.set_parent(riser, parent);

		self.set_child(riser, dir, pivot);
		self.set_parent(pivot, riser);
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Splices a new external node holding `key` and `value` before `anchor`
	/// in both the list and the tree, without rebalancing.
	///
	/// Returns the new external and, when the tree was not empty, the red
	/// internal node that replaced the split leaf. Two arena slots must have
	/// been reserved.
	pub(crate) fn split_before(&mut self, anchor: NodeId, key: K, value: V) -> (NodeId, Option<NodeId>) {
		let node = self.alloc(Node::external(key, value));

		if self.root() == HEAD {
			debug_assert_eq!(anchor, HEAD, "anchor must be the sentinel of an empty tree");
			self.replace_child(HEAD, HEAD, node);
			self.set_parent(node, HEAD);
			self.link_before(HEAD, node);
			return (node, None);
		}

		// Appending splits the last leaf and puts the new node on its right;
		// otherwise the anchor's own leaf splits with the new node on its left.
		// Neither changes the last external of any existing subtree, so no
		// routing link above the split needs repair.
		let (leaf, left, right) = if anchor == HEAD {
			let last = self.last();
			(last, last, node)
		} else {
			(anchor, node, anchor)
		};
		self.link_before(anchor, node);

		let parent = self.parent(leaf);
		let internal = self.alloc(Node::internal(parent, left, right));
		self.replace_child(parent, leaf, internal);
		self.set_parent(left, internal);
		self.set_parent(right, internal);
		(node, Some(internal))
	}

	pub(crate) fn classify_insert(&self, n: NodeId) -> InsertCase {
		let parent = self.parent(n);
		if parent == HEAD {
			return InsertCase::Root;
		}
		if !self.is_red(parent) {
			return InsertCase::BlackParent;
		}

		// A red parent is never the root, so the grandparent is internal.
		let grandparent = self.parent(parent);
		let side = self.side_of(grandparent, parent);
		let uncle = self.child(grandparent, side.opposite());
		if self.is_red(uncle) {
			return InsertCase::RedUncle {
				parent,
				uncle,
				grandparent,
			};
		}

		if self.side_of(parent, n) == side {
			InsertCase::OuterChild {
				parent,
				grandparent,
				side,
			}
		} else {
			InsertCase::InnerChild {
				parent,
				side,
			}
		}
	}

	/// Restores the red-black invariants after `n` was made red.
	pub(crate) fn insert_fixup(&mut self, mut n: NodeId) {
		loop {
			let case = self.classify_insert(n);
			trace!("insert fixup at {:?}: {:?}", n, case);
			match case {
				InsertCase::Root => {
					self.set_color(n, Color::Black);
					return;
				}
				InsertCase::BlackParent => return,
				InsertCase::RedUncle {
					parent,
					uncle,
					grandparent,
				} => {
					self.set_color(parent, Color::Black);
					self.set_color(uncle, Color::Black);
					self.set_color(grandparent, Color::Red);
					n = grandparent;
				}
				InsertCase::InnerChild {
					parent,
					side,
				} => {
					// `n` rises above `parent`; the old parent is now the
					// outer red child to continue from.
					self.rotate(parent, side);
					n = parent;
				}
				InsertCase::OuterChild {
					parent,
					grandparent,
					side,
				} => {
					self.set_color(parent, Color::Black);
					self.set_color(grandparent, Color::Red);
					self.rotate(grandparent, side.opposite());
					return;
				}
			}
		}
	}

	// -----------------------------------------------------------------------
	// Deletion
	// -----------------------------------------------------------------------

	/// Removes external `node` from the tree shape (not the list) by
	/// collapsing its parent into the sibling subtree.
	///
	/// The routing link that named `node` is pointed at `node`'s list
	/// predecessor, so the list must still hold `node` when this runs. The
	/// parent's slot is released here; `node`'s slot is left to the caller.
	/// Returns the node needing delete-fixup, if a black node was removed.
	pub(crate) fn collapse(&mut self, node: NodeId) -> Option<NodeId> {
		let parent = self.parent(node);
		if parent == HEAD {
			self.replace_child(HEAD, node, HEAD);
			return None;
		}

		let side = self.side_of(parent, node);
		if side == Side::Right {
			// `node` is the last external under `parent`. The nearest
			// ancestor holding that subtree on its left routes through it.
			let mut cur = parent;
			loop {
				let up = self.parent(cur);
				if up == HEAD {
					break;
				}
				if self.child(up, Side::Left) == cur {
					debug_assert_eq!(self.lext(up), node);
					let prev = self.prev(node);
					self.set_lext(up, prev);
					break;
				}
				cur = up;
			}
		}

		let sibling = self.child(parent, side.opposite());
		let grandparent = self.parent(parent);
		self.replace_child(grandparent, parent, sibling);
		self.set_parent(sibling, grandparent);

		let removed = self.release(parent);
		match removed.color {
			Color::Black => Some(sibling),
			Color::Red => None,
		}
	}

	pub(crate) fn classify_delete(&self, x: NodeId) -> DeleteCase {
		let parent = self.parent(x);
		if self.is_red(x) || parent == HEAD {
			return DeleteCase::Absorb;
		}

		let side = self.side_of(parent, x);
		let sibling = self.child(parent, side.opposite());
		if self.is_red(sibling) {
			return DeleteCase::RedSibling {
				parent,
				sibling,
				side,
			};
		}

		// The sibling's subtree is one black taller than `x`'s, so it is an
		// internal node whenever the tree is well formed.
		debug_assert!(self.is_internal(sibling), "short side {:?} has an external sibling", x);
		let near = self.child(sibling, side);
		let far = self.child(sibling, side.opposite());
		if self.is_red(far) {
			DeleteCase::FarNephewRed {
				parent,
				sibling,
				nephew: far,
				side,
			}
		} else if self.is_red(near) {
			DeleteCase::NearNephewRed {
				sibling,
				nephew: near,
				side,
			}
		} else {
			DeleteCase::BlackNephews {
				parent,
				sibling,
			}
		}
	}

	/// Repairs a one-black deficit on every path through `x`.
	pub(crate) fn delete_fixup(&mut self, mut x: NodeId) {
		loop {
			let case = self.classify_delete(x);
			trace!("delete fixup at {:?}: {:?}", x, case);
			match case {
				DeleteCase::Absorb => {
					self.set_color(x, Color::Black);
					return;
				}
				DeleteCase::RedSibling {
					parent,
					sibling,
					side,
				} => {
					self.set_color(sibling, Color::Black);
					self.set_color(parent, Color::Red);
					self.rotate(parent, side);
				}
				DeleteCase::BlackNephews {
					parent,
					sibling,
				} => {
					self.set_color(sibling, Color::Red);
					x = parent;
				}
				DeleteCase::NearNephewRed {
					sibling,
					nephew,
					side,
				} => {
					self.set_color(nephew, Color::Black);
					self.set_color(sibling, Color::Red);
					self.rotate(sibling, side.opposite());
				}
				DeleteCase::FarNephewRed {
					parent,
					sibling,
					nephew,
					side,
				} => {
					let parent_color = self.color(parent);
					self.set_color(sibling, parent_color);
					self.set_color(parent, Color::Black);
					self.set_color(nephew, Color::Black);
					self.rotate(parent, side);
					return;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::sample_tree;
	use crate::IntTree;

	/// Splices `key` before the ceiling of `key` without rebalancing and
	/// returns the red internal node left behind.
	fn raw_split(tree: &mut IntTree<i64>, key: i64) -> NodeId {
		let (anchor, _) = tree.ceiling(&key);
		tree.arena.reserve(2).unwrap();
		let (_, internal) = tree.arena.split_before(anchor, key, key);
		tree.len += 1;
		internal.expect("tree was not empty")
	}

	fn external(tree: &IntTree<i64>, key: i64) -> NodeId {
		let (id, found) = tree.ceiling(&key);
		assert!(found, "key {} missing", key);
		id
	}

	fn ascending(n: i64) -> IntTree<i64> {
		let mut tree = IntTree::new();
		for k in 1..=n {
			tree.insert(k * 10, k * 10).unwrap();
		}
		tree
	}

	// -----------------------------------------------------------------------
	// Insert cases
	// -----------------------------------------------------------------------

	#[test]
	fn insert_case_root() {
		let mut tree = ascending(1);
		let n = raw_split(&mut tree, 20);
		assert_eq!(tree.arena.classify_insert(n), InsertCase::Root);
		tree.arena.insert_fixup(n);
		tree.assert_invariants();
		assert_eq!(tree.arena.color(tree.arena.root()), Color::Black);
	}

	#[test]
	fn insert_case_black_parent() {
		let mut tree = ascending(2);
		let n = raw_split(&mut tree, 30);
		assert_eq!(tree.arena.classify_insert(n), InsertCase::BlackParent);
		tree.arena.insert_fixup(n);
		tree.assert_invariants();
	}

	#[test]
	fn insert_case_outer_child() {
		// 10 | (20 30), the right child red; appending 40 leans right twice.
		let mut tree = ascending(3);
		let n = raw_split(&mut tree, 40);
		let parent = tree.arena.parent(n);
		let grandparent = tree.arena.parent(parent);
		assert_eq!(
			tree.arena.classify_insert(n),
			InsertCase::OuterChild {
				parent,
				grandparent,
				side: Side::Right,
			}
		);
		tree.arena.insert_fixup(n);
		tree.assert_invariants();
		assert_eq!(tree.arena.root(), parent, "the red parent rises to the root");
	}

	#[test]
	fn insert_case_inner_child() {
		// Splitting 20, the left leaf of the red right child, leans inward.
		let mut tree = ascending(3);
		let n = raw_split(&mut tree, 15);
		let parent = tree.arena.parent(n);
		assert_eq!(
			tree.arena.classify_insert(n),
			InsertCase::InnerChild {
				parent,
				side: Side::Right,
			}
		);
		tree.arena.insert_fixup(n);
		tree.assert_invariants();
		assert_eq!(tree.arena.root(), n, "the inner node rises twice");
	}

	#[test]
	fn insert_case_red_uncle() {
		// After four ascending inserts the root has two red children.
		let mut tree = ascending(4);
		let n = raw_split(&mut tree, 50);
		let parent = tree.arena.parent(n);
		let grandparent = tree.arena.parent(parent);
		let uncle = tree.arena.child(grandparent, Side::Left);
		assert_eq!(
			tree.arena.classify_insert(n),
			InsertCase::RedUncle {
				parent,
				uncle,
				grandparent,
			}
		);
		tree.arena.insert_fixup(n);
		tree.assert_invariants();
		assert_eq!(tree.arena.color(uncle), Color::Black);
	}

	// -----------------------------------------------------------------------
	// Delete cases
	// -----------------------------------------------------------------------

	/// Collapses the leaf holding `key` and returns the node left short of a
	/// black, after unlinking it from the list the way `delete` does.
	fn raw_collapse(tree: &mut IntTree<i64>, key: i64) -> NodeId {
		let id = external(tree, key);
		let x = tree.arena.collapse(id).expect("a black parent was removed");
		tree.arena.unlink(id);
		tree.arena.release(id);
		tree.len -= 1;
		x
	}

	const BALANCED: &str = r#"
		{"black": [{"black": [10, 20]}, {"black": [30, 40]}]}
	"#;

	const FAR_RED: &str = r#"
		{"black": [{"black": [10, 20]}, {"black": [30, {"red": [40, 50]}]}]}
	"#;

	const NEAR_RED: &str = r#"
		{"black": [{"black": [10, 20]}, {"black": [{"red": [30, 40]}, 50]}]}
	"#;

	const RED_SIBLING: &str = r#"
		{"black": [{"black": [10, 20]}, {"red": [{"black": [30, 40]}, {"black": [50, 60]}]}]}
	"#;

	#[test]
	fn fixtures_are_valid_red_black_trees() {
		for fixture in [BALANCED, FAR_RED, NEAR_RED, RED_SIBLING] {
			sample_tree(fixture).unwrap().assert_invariants();
		}
	}

	#[test]
	fn delete_case_absorb_at_root() {
		let mut tree = sample_tree(r#"{"black": [10, 20]}"#).unwrap();
		let x = raw_collapse(&mut tree, 10);
		assert_eq!(tree.arena.root(), x);
		assert_eq!(tree.arena.classify_delete(x), DeleteCase::Absorb);
		tree.arena.delete_fixup(x);
		tree.assert_invariants();
	}

	#[test]
	fn delete_case_red_parent_needs_no_fixup() {
		let mut tree = sample_tree(r#"{"black": [10, {"red": [20, 30]}]}"#).unwrap();
		let id = external(&tree, 20);
		assert_eq!(tree.arena.collapse(id), None);
		tree.arena.unlink(id);
		tree.arena.release(id);
		tree.len -= 1;
		tree.assert_invariants();
	}

	#[test]
	fn delete_case_black_nephews() {
		let mut tree = sample_tree(BALANCED).unwrap();
		let x = raw_collapse(&mut tree, 10);
		let parent = tree.arena.parent(x);
		let sibling = tree.arena.child(parent, Side::Right);
		assert_eq!(
			tree.arena.classify_delete(x),
			DeleteCase::BlackNephews {
				parent,
				sibling,
			}
		);
		tree.arena.delete_fixup(x);
		tree.assert_invariants();
		assert_eq!(tree.arena.color(sibling), Color::Red);
	}

	#[test]
	fn delete_case_far_nephew_red() {
		let mut tree = sample_tree(FAR_RED).unwrap();
		let x = raw_collapse(&mut tree, 10);
		let parent = tree.arena.parent(x);
		let sibling = tree.arena.child(parent, Side::Right);
		let nephew = tree.arena.child(sibling, Side::Right);
		assert_eq!(
			tree.arena.classify_delete(x),
			DeleteCase::FarNephewRed {
				parent,
				sibling,
				nephew,
				side: Side::Left,
			}
		);
		tree.arena.delete_fixup(x);
		tree.assert_invariants();
		assert_eq!(tree.arena.root(), sibling);
	}

	#[test]
	fn delete_case_near_nephew_red() {
		let mut tree = sample_tree(NEAR_RED).unwrap();
		let x = raw_collapse(&mut tree, 10);
		let parent = tree.arena.parent(x);
		let sibling = tree.arena.child(parent, Side::Right);
		let nephew = tree.arena.child(sibling, Side::Left);
		assert_eq!(
			tree.arena.classify_delete(x),
			DeleteCase::NearNephewRed {
				sibling,
				nephew,
				side: Side::Left,
			}
		);
		tree.arena.delete_fixup(x);
		tree.assert_invariants();
		assert_eq!(tree.arena.root(), nephew, "the near nephew rises twice");
	}

	#[test]
	fn delete_case_red_sibling() {
		let mut tree = sample_tree(RED_SIBLING).unwrap();
		let x = raw_collapse(&mut tree, 10);
		let parent = tree.arena.parent(x);
		let sibling = tree.arena.child(parent, Side::Right);
		assert_eq!(
			tree.arena.classify_delete(x),
			DeleteCase::RedSibling {
				parent,
				sibling,
				side: Side::Left,
			}
		);
		tree.arena.delete_fixup(x);
		tree.assert_invariants();
		assert_eq!(tree.arena.root(), sibling);
	}

	#[test]
	fn mirrored_delete_uses_the_same_cases() {
		// Deleting the rightmost leaf exercises the mirror of the far-red case.
		let mut tree = sample_tree(r#"{"black": [{"black": [{"red": [10, 20]}, 30]}, {"black": [40, 50]}]}"#).unwrap();
		tree.assert_invariants();
		let x = raw_collapse(&mut tree, 50);
		assert!(matches!(
			tree.arena.classify_delete(x),
			DeleteCase::FarNephewRed {
				side: Side::Right,
				..
			}
		));
		tree.arena.delete_fixup(x);
		tree.assert_invariants();
	}

	#[test]
	fn rotation_keeps_routing_links() {
		let mut tree = sample_tree(BALANCED).unwrap();
		let root = tree.arena.root();
		let right = tree.arena.child(root, Side::Right);
		let routes = |tree: &IntTree<i64>| [root, right].map(|n| tree.arena.lext(n));
		let before = routes(&tree);

		tree.arena.rotate(root, Side::Left);
		assert_eq!(tree.arena.root(), right);
		assert_eq!(routes(&tree), before);

		tree.arena.rotate(right, Side::Right);
		assert_eq!(tree.arena.root(), root);
		assert_eq!(routes(&tree), before);
		tree.assert_invariants();
	}
}
