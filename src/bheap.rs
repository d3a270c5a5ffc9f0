use std::fmt;
use std::fmt::Write;

use crate::arena::{Arena, Handle};
use crate::{HeapError, MeldableHeap};

/// One node of a binomial tree.  `child` is the highest-degree child and
/// child lists run in decreasing degree; root lists run in increasing
/// degree through `sibling`.
struct BinomNode<K> {
	key: K,
	parent: Option<u32>,
	child: Option<u32>,
	sibling: Option<u32>,
	degree: u32
}

/// A binomial heap: a degree-sorted list of binomial trees, at most one of
/// each degree, each obeying min-heap order.
///
/// Everything reduces to list merging: insert merges a singleton list,
/// extract-min merges the reversed child list of the removed root, and
/// melding merges the two root lists, each followed by one combining pass
/// that links equal-degree neighbors.  The minimum root is re-derived by an
/// O(log n) root scan after every structural change.
pub struct BinomHeap<K> {
	nodes: Arena<BinomNode<K>>,
	head: Option<u32>,
	min: Option<u32>
}

impl<K> Default for BinomHeap<K> {
	fn default() -> Self {
		Self{nodes: Arena::new(), head: None, min: None}
	}
}

impl<K: Ord> BinomHeap<K> {
	/// Make `child` the new highest-degree child of `parent`.
	/// Both must be roots of equal degree.
	fn link(&mut self, child: u32, parent: u32) {
		self.nodes[child].parent = Some(parent);
		self.nodes[child].sibling = self.nodes[parent].child;
		self.nodes[parent].child = Some(child);
		self.nodes[parent].degree += 1;
	}

	/// Zip two degree-sorted root lists into one, stably (ties take from
	/// `a` first).  No linking happens here; equal-degree neighbors are
	/// left for the combining pass.
	fn merge_lists(&mut self, mut a: Option<u32>, mut b: Option<u32>) -> Option<u32> {
		let mut head = None;
		let mut tail: Option<u32> = None;
		loop {
			let next = match (a, b) {
				(None, None) => break,
				(Some(x), None) => {
					a = self.nodes[x].sibling;
					x
				},
				(None, Some(y)) => {
					b = self.nodes[y].sibling;
					y
				},
				(Some(x), Some(y)) => if self.nodes[x].degree <= self.nodes[y].degree {
					a = self.nodes[x].sibling;
					x
				} else {
					b = self.nodes[y].sibling;
					y
				}
			};
			self.nodes[next].sibling = None;
			match tail {
				None => head = Some(next),
				Some(t) => self.nodes[t].sibling = Some(next)
			}
			tail = Some(next);
		}
		head
	}

	/// Walk the merged root list linking equal-degree neighbors until at
	/// most one tree of each degree remains.  At most two neighbors can
	/// share a degree, except that a carry can make it three; in that case
	/// the first is passed over and the trailing pair links.
	fn union_pass(&mut self) {
		let Some(head) = self.head else { return };
		let mut prev: Option<u32> = None;
		let mut cur = head;
		let mut next_opt = self.nodes[cur].sibling;
		while let Some(next) = next_opt {
			let after = self.nodes[next].sibling;
			if self.nodes[cur].degree != self.nodes[next].degree
				|| after.is_some_and(|x| self.nodes[x].degree == self.nodes[cur].degree) {
				prev = Some(cur);
				cur = next;
			} else if self.nodes[cur].key <= self.nodes[next].key {
				self.nodes[cur].sibling = after;
				self.link(next, cur);
			} else {
				match prev {
					None => self.head = Some(next),
					Some(p) => self.nodes[p].sibling = Some(next)
				}
				self.link(cur, next);
				cur = next;
			}
			next_opt = self.nodes[cur].sibling;
		}
	}

	/// Re-derive the cached minimum root.  O(log n); the original tracked
	/// it incrementally during the union but left it stale on the
	/// early-exit insert path.
	fn refresh_min(&mut self) {
		self.min = self.head;
		let mut cur = self.head;
		while let Some(c) = cur {
			if self.nodes[c].key < self.nodes[self.min.unwrap()].key {
				self.min = Some(c);
			}
			cur = self.nodes[c].sibling;
		}
	}

	/// Unlink root `r` from the root list and merge its reversed child
	/// list (a valid binomial heap of its own) back in.  `r` itself is
	/// left orphaned for the caller to free.
	fn remove_root(&mut self, r: u32) {
		let mut prev: Option<u32> = None;
		let mut cur = self.head;
		while let Some(c) = cur {
			if c == r {
				break
			}
			prev = Some(c);
			cur = self.nodes[c].sibling;
		}
		match prev {
			None => self.head = self.nodes[r].sibling.take(),
			Some(p) => self.nodes[p].sibling = self.nodes[r].sibling.take()
		}
		// children run in decreasing degree; reversing them yields the
		// increasing-degree root list the merge expects
		let mut rev = None;
		let mut cur = self.nodes[r].child.take();
		while let Some(c) = cur {
			let next = self.nodes[c].sibling;
			self.nodes[c].sibling = rev;
			self.nodes[c].parent = None;
			rev = Some(c);
			cur = next;
		}
		self.head = self.merge_lists(self.head, rev);
		self.union_pass();
		self.refresh_min();
	}

	/// Preorder search of one tree, pruning subtrees whose root already
	/// exceeds `key`
	fn preorder_find(&self, n: u32, key: &K) -> Option<u32> {
		if self.nodes[n].key > *key {
			return None
		}
		if self.nodes[n].key == *key {
			return Some(n)
		}
		let mut child = self.nodes[n].child;
		while let Some(c) = child {
			if let Some(found) = self.preorder_find(c, key) {
				return Some(found)
			}
			child = self.nodes[c].sibling;
		}
		None
	}
}

impl<K: Ord + fmt::Debug> MeldableHeap<K> for BinomHeap<K> {
	type Handle = Handle;

	fn new() -> Self {
		Self::default()
	}

	fn len(&self) -> usize {
		self.nodes.len()
	}

	fn insert(&mut self, key: K) -> Handle {
		let n = self.nodes.alloc(BinomNode{key, parent: None, child: None, sibling: None, degree: 0});
		self.head = self.merge_lists(self.head, Some(n));
		self.union_pass();
		self.refresh_min();
		self.nodes.handle(n)
	}

	fn minimum(&self) -> Result<&K, HeapError> {
		self.min.map(|m| &self.nodes[m].key).ok_or(HeapError::EmptyHeap)
	}

	fn extract_min(&mut self) -> Result<K, HeapError> {
		let m = self.min.ok_or(HeapError::EmptyHeap)?;
		self.remove_root(m);
		let node = self.nodes.free(m);
		Ok(node.key)
	}

	fn merge(&mut self, other: Self) {
		let BinomHeap{nodes, head, min: _} = other;
		let Some(oh) = head else { return };
		let off = self.nodes.absorb(nodes, |node, off| {
			if let Some(x) = node.parent.as_mut() {
				*x += off;
			}
			if let Some(x) = node.child.as_mut() {
				*x += off;
			}
			if let Some(x) = node.sibling.as_mut() {
				*x += off;
			}
		});
		self.head = self.merge_lists(self.head, Some(oh + off));
		self.union_pass();
		self.refresh_min();
	}

	/// Bubble the lowered key toward the root by parent swaps.  Handles are
	/// positional: handles into the swap path afterwards see shifted keys.
	fn decrease_key(&mut self, h: &Handle, new_key: K) -> Result<(), HeapError> {
		let mut n = self.nodes.lookup(h).ok_or(HeapError::NotFound)?;
		if new_key > self.nodes[n].key {
			return Err(HeapError::InvalidDecrease)
		}
		self.nodes[n].key = new_key;
		while let Some(p) = self.nodes[n].parent {
			if self.nodes[n].key >= self.nodes[p].key {
				break
			}
			let (a, b) = self.nodes.get2_mut(n, p);
			std::mem::swap(&mut a.key, &mut b.key);
			n = p;
		}
		self.refresh_min();
		Ok(())
	}

	/// Bubble the doomed key unconditionally to its root, then remove that
	/// root the way extract_min does
	fn delete(&mut self, h: &Handle) -> Result<(), HeapError> {
		let mut n = self.nodes.lookup(h).ok_or(HeapError::NotFound)?;
		while let Some(p) = self.nodes[n].parent {
			let (a, b) = self.nodes.get2_mut(n, p);
			std::mem::swap(&mut a.key, &mut b.key);
			n = p;
		}
		self.remove_root(n);
		self.nodes.free(n);
		Ok(())
	}

	/// Root list order, preorder within each tree, pruned by heap order
	fn find(&self, key: &K) -> Result<Handle, HeapError> {
		let mut cur = self.head;
		while let Some(r) = cur {
			if let Some(n) = self.preorder_find(r, key) {
				return Ok(self.nodes.handle(n))
			}
			cur = self.nodes[r].sibling;
		}
		Err(HeapError::NotFound)
	}

	fn dump(&self) -> String {
		let mut out = String::new();
		let mut cur = self.head;
		while let Some(r) = cur {
			let _ = write!(out, "B({}) =", self.nodes[r].degree);
			self.dump_preorder(r, &mut out);
			out.push('\n');
			cur = self.nodes[r].sibling;
		}
		out
	}
}

impl<K: Ord + fmt::Debug> BinomHeap<K> {
	fn dump_preorder(&self, n: u32, out: &mut String) {
		let _ = write!(out, " {:?}", self.nodes[n].key);
		let mut child = self.nodes[n].child;
		while let Some(c) = child {
			self.dump_preorder(c, out);
			child = self.nodes[c].sibling;
		}
	}
}

#[cfg(test)]
impl<K: Ord> BinomHeap<K> {
	/// Root degrees strictly increasing, every tree a proper heap-ordered
	/// binomial tree, cached min actually minimal, node count consistent
	fn check(&self) {
		let mut count = 0;
		let mut last_degree = None;
		let mut cur = self.head;
		while let Some(r) = cur {
			assert!(self.nodes[r].parent.is_none());
			assert!(last_degree < Some(self.nodes[r].degree), "root degrees out of order");
			last_degree = Some(self.nodes[r].degree);
			if let Some(m) = self.min {
				assert!(self.nodes[m].key <= self.nodes[r].key, "cached min not minimal");
			}
			count += self.check_tree(r);
			cur = self.nodes[r].sibling;
		}
		assert_eq!(count, self.nodes.len(), "unreachable or duplicated nodes");
		assert_eq!(self.head.is_none(), self.min.is_none());
	}

	fn check_tree(&self, n: u32) -> usize {
		let mut count = 1;
		let mut expect = self.nodes[n].degree;
		let mut child = self.nodes[n].child;
		while let Some(c) = child {
			expect -= 1;
			assert_eq!(self.nodes[c].degree, expect, "child degrees must descend");
			assert_eq!(self.nodes[c].parent, Some(n));
			assert!(self.nodes[c].key >= self.nodes[n].key, "heap order broken");
			count += self.check_tree(c);
			child = self.nodes[c].sibling;
		}
		assert_eq!(expect, 0, "missing children");
		assert_eq!(count, 1 << self.nodes[n].degree);
		count
	}
}
