//! Test utilities for building trees of an exact shape from JSON fixtures.
//!
//! A fixture is either an integer (an external node whose key and value are
//! that integer) or an object with a single `"red"` or `"black"` field
//! holding the two children of an internal node:
//!
//! ```
//! let tree = rblist::util::sample_tree(r#"{"black": [10, {"red": [20, 30]}]}"#).unwrap();
//! tree.assert_invariants();
//! assert_eq!(tree.len(), 3);
//! ```
//!
//! No rebalancing happens while building, so a fixture can describe any
//! shape, valid or not; call `assert_invariants` to check it.
use serde::Deserialize;

use crate::node::{Color, Node, NodeId, Side, HEAD};
use crate::IntTree;

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Shape {
	Leaf(i64),
	Internal(Internal),
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum Internal {
	Red(Box<Shape>, Box<Shape>),
	Black(Box<Shape>, Box<Shape>),
}

/// Builds `shape` under `parent` and returns the new subtree's root and the
/// last external inside it.
fn translate_node(tree: &mut IntTree<i64>, shape: Shape, parent: NodeId) -> (NodeId, NodeId) {
	match shape {
		Shape::Leaf(key) => {
			let id = tree.arena.alloc(Node::external(key, key));
			tree.arena.set_parent(id, parent);
			tree.arena.link_before(HEAD, id);
			tree.len += 1;
			(id, id)
		}
		Shape::Internal(internal) => {
			let (color, left, right) = match internal {
				Internal::Red(left, right) => (Color::Red, left, right),
				Internal::Black(left, right) => (Color::Black, left, right),
			};
			// Children are patched in once they exist.
			let id = tree.arena.alloc(Node::internal(parent, HEAD, HEAD));
			tree.arena.set_color(id, color);
			let (left, lext) = translate_node(tree, *left, id);
			let (right, last) = translate_node(tree, *right, id);
			tree.arena.set_child(id, Side::Left, left);
			tree.arena.set_child(id, Side::Right, right);
			tree.arena.set_lext(id, lext);
			(id, last)
		}
	}
}

/// Builds an integer-keyed tree with exactly the shape and colors described
/// by the JSON `fixture`.
pub fn sample_tree(fixture: &str) -> serde_json::Result<IntTree<i64>> {
	let shape: Shape = serde_json::from_str(fixture)?;
	let mut tree = IntTree::new();
	let (root, _) = translate_node(&mut tree, shape, HEAD);
	tree.arena.replace_child(HEAD, HEAD, root);
	Ok(tree)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn leaf_fixture_is_a_single_node() {
		let tree = sample_tree("7").unwrap();
		tree.assert_invariants();
		assert_eq!(tree.len(), 1);
		assert!(!tree.find_ceiling(&7).is_sentinel());
	}

	#[test]
	fn fixture_keeps_list_in_leaf_order() {
		let tree = sample_tree(r#"{"black": [{"red": [1, 2]}, {"red": [3, 4]}]}"#).unwrap();
		tree.assert_invariants();
		let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
		assert_eq!(keys, vec![1, 2, 3, 4]);
	}

	#[test]
	fn malformed_fixture_is_rejected() {
		assert!(sample_tree(r#"{"green": [1, 2]}"#).is_err());
		assert!(sample_tree(r#"{"red": [1]}"#).is_err());
	}

	#[test]
	#[should_panic(expected = "red")]
	fn invalid_coloring_is_caught() {
		// A red node with a red child.
		sample_tree(r#"{"black": [1, {"red": [2, {"red": [3, 4]}]}]}"#).unwrap().assert_invariants();
	}
}
