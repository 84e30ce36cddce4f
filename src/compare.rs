//! Key ordering for the tree.
//!
//! A tree fixes its ordering once, at construction, through a value
//! implementing [`Comparator`]. The balancing and list code never looks at
//! keys; only the query engine calls the comparator, so the same skeleton
//! serves string, integer and caller-defined keys.

use std::cmp::Ordering;
use std::fmt;

/// A three-way comparison over keys of type `K`.
///
/// Implementations must describe a total order and must stay consistent for
/// the lifetime of the tree. A comparator that changes its mind about two
/// keys already in the tree breaks the ceiling queries, though never the
/// red-black structure itself.
pub trait Comparator<K: ?Sized> {
	/// Compares `a` against `b`.
	fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
///
/// This is the integer ordering used by [`IntTree`](crate::IntTree): signed
/// numeric comparison.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		a.cmp(b)
	}
}

/// Orders keys lexicographically by their bytes.
///
/// Used by [`StrTree`](crate::StrTree). Works for any key viewable as a byte
/// slice, so a `String` tree can be queried with `&str`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByteOrder;

impl<K: AsRef<[u8]> + ?Sized> Comparator<K> for ByteOrder {
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		a.as_ref().cmp(b.as_ref())
	}
}

/// Orders keys with a caller-supplied function returning [`Ordering`].
///
/// ```
/// use rblist::{FnOrder, Tree};
///
/// // Case-insensitive ordering.
/// let order = FnOrder(|a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase()));
/// let mut tree = Tree::with_comparator(order);
/// tree.insert("beta".to_string(), 2).unwrap();
/// tree.insert("Alpha".to_string(), 1).unwrap();
///
/// let first = tree.first();
/// assert_eq!(tree.key(&first).map(String::as_str), Some("Alpha"));
/// ```
#[derive(Clone, Copy)]
pub struct FnOrder<F>(pub F);

impl<K: ?Sized, F> Comparator<K> for FnOrder<F>
where
	F: Fn(&K, &K) -> Ordering,
{
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		(self.0)(a, b)
	}
}

impl<F> fmt::Debug for FnOrder<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("FnOrder(..)")
	}
}

/// Orders keys with a function returning a negative, zero or positive
/// integer, in the manner of `strcmp`.
///
/// ```
/// use rblist::{SignOrder, Tree};
///
/// let mut tree = Tree::with_comparator(SignOrder(|a: &u32, b: &u32| *b as i32 - *a as i32));
/// tree.insert(1u32, "low").unwrap();
/// tree.insert(9u32, "high").unwrap();
///
/// // Descending order.
/// assert_eq!(tree.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![9, 1]);
/// ```
#[derive(Clone, Copy)]
pub struct SignOrder<F>(pub F);

impl<K: ?Sized, F> Comparator<K> for SignOrder<F>
where
	F: Fn(&K, &K) -> i32,
{
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		(self.0)(a, b).cmp(&0)
	}
}

impl<F> fmt::Debug for SignOrder<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SignOrder(..)")
	}
}
