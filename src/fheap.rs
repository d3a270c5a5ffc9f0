use std::collections::VecDeque;
use std::fmt;
use std::fmt::Write;

use crate::arena::{Arena, Handle};
use crate::{HeapError, MeldableHeap};

/// One node of a fibonacci heap.  Siblings form a circular doubly-linked
/// ring through `left`/`right` (a singleton node rings to itself); `child`
/// is an arbitrary entry point into the child ring.  All links are arena
/// slot indices.
struct FibNode<K> {
	key: K,
	parent: Option<u32>,
	child: Option<u32>,
	left: u32,
	right: u32,
	degree: u32,
	/// Whether this node has lost a child since it last became a child
	/// itself.  Always false for roots.
	mark: bool
}

/// A fibonacci heap: a ring of heap-ordered multiway trees with a pointer
/// to the minimal root.
///
/// `insert`, `minimum`, `merge`, and `decrease_key` are O(1) amortized;
/// `extract_min` and `delete` are O(log n) amortized.  The cheap operations
/// stay cheap by being lazy: nothing is restructured until an extraction
/// forces a consolidation pass, and `decrease_key` repairs heap order by
/// cutting the offending subtree loose rather than rebalancing.  The mark
/// bits bound how ragged the trees can get: a non-root that loses a second
/// child is cut as well, cascading up the ancestor chain.
pub struct FibHeap<K> {
	nodes: Arena<FibNode<K>>,
	min: Option<u32>
}

impl<K> Default for FibHeap<K> {
	fn default() -> Self {
		Self{nodes: Arena::new(), min: None}
	}
}

impl<K> FibHeap<K> {
	/// Splice `n` into the ring immediately to the left of `entry`, or make
	/// it a singleton ring.  `n`'s previous ring links are overwritten, and
	/// the caller keeps responsibility for `n` being reachable (via `min` or
	/// a `child` entry point).
	fn ring_insert(&mut self, entry: Option<u32>, n: u32) {
		match entry {
			None => {
				self.nodes[n].left = n;
				self.nodes[n].right = n;
			},
			Some(e) => {
				let prev = self.nodes[e].left;
				self.nodes[n].left = prev;
				self.nodes[n].right = e;
				self.nodes[prev].right = n;
				self.nodes[e].left = n;
			}
		}
	}

	/// Unlink `n` from its ring, relinking its neighbors to each other.
	/// Returns a surviving ring member (`n`'s former right neighbor), or
	/// `None` if `n` was the whole ring.  `n` is left as a singleton ring.
	fn ring_remove(&mut self, n: u32) -> Option<u32> {
		let (l, r) = (self.nodes[n].left, self.nodes[n].right);
		if r == n {
			return None
		}
		self.nodes[l].right = r;
		self.nodes[r].left = l;
		self.nodes[n].left = n;
		self.nodes[n].right = n;
		Some(r)
	}
}

impl<K: Ord> FibHeap<K> {
	/// Union two equal-degree roots: the smaller key becomes the parent
	/// (ties keep the first argument), the loser joins its child ring with
	/// a cleared mark.  Ring links of both within the root ring are dead
	/// after this; consolidation rebuilds the root ring from scratch.
	fn link(&mut self, a: u32, b: u32) -> u32 {
		let (parent, child) = if self.nodes[b].key < self.nodes[a].key { (b, a) } else { (a, b) };
		let entry = self.nodes[parent].child;
		self.ring_insert(entry, child);
		if entry.is_none() {
			self.nodes[parent].child = Some(child);
		}
		self.nodes[child].parent = Some(parent);
		self.nodes[child].mark = false;
		self.nodes[parent].degree += 1;
		parent
	}

	/// Repeatedly union equal-degree roots until every root has a distinct
	/// degree, then rebuild the root ring and recompute `min`.  Only called
	/// from `extract_min`; insert and merge stay O(1) by tolerating degree
	/// collisions until the next extraction.
	fn consolidate(&mut self) {
		// holds at most one root per degree; starts at floor(log2 n) + 1
		// slots and grows on demand, since fibonacci-tree degrees can
		// slightly exceed log2 n
		let mut by_degree: Vec<Option<u32>> = vec![None; self.nodes.len().ilog2() as usize + 1];
		// snapshot the ring first: every root present now must be visited
		// exactly once, and the walk below relinks as it merges
		let start = self.min.unwrap();
		let mut roots = Vec::new();
		let mut cur = start;
		loop {
			roots.push(cur);
			cur = self.nodes[cur].right;
			if cur == start {
				break
			}
		}
		for mut x in roots {
			loop {
				let d = self.nodes[x].degree as usize;
				if d >= by_degree.len() {
					by_degree.resize(d + 1, None);
				}
				match by_degree[d].take() {
					None => {
						by_degree[d] = Some(x);
						break
					},
					Some(y) => x = self.link(x, y)
				}
			}
		}
		self.min = None;
		for r in by_degree.into_iter().flatten() {
			self.nodes[r].left = r;
			self.nodes[r].right = r;
			self.ring_insert(self.min, r);
			if self.min.map_or(true, |m| self.nodes[r].key < self.nodes[m].key) {
				self.min = Some(r);
			}
		}
	}

	/// Detach `n` from its parent `p` and make it a root, clearing its mark
	fn cut(&mut self, n: u32, p: u32) {
		let rest = self.ring_remove(n);
		if self.nodes[p].child == Some(n) {
			self.nodes[p].child = rest;
		}
		self.nodes[p].degree -= 1;
		self.ring_insert(self.min, n);
		self.nodes[n].parent = None;
		self.nodes[n].mark = false;
	}

	/// Walk up from a node that just lost a child.  An unmarked non-root
	/// absorbs the loss by getting marked; a marked one is cut loose as
	/// well and the loss propagates to its parent.  Iterative on purpose:
	/// the marked chain is the only recursion the classical formulation
	/// has, and it is unbounded in adversarial inputs.
	fn cascading_cut(&mut self, mut n: u32) {
		while let Some(p) = self.nodes[n].parent {
			if !self.nodes[n].mark {
				self.nodes[n].mark = true;
				return
			}
			self.cut(n, p);
			n = p;
		}
	}

	/// Breadth-first search of one tree for `key`, pruning subtrees whose
	/// root already exceeds it (descendants only grow under heap order)
	fn search_tree(&self, root: u32, key: &K) -> Option<u32> {
		if self.nodes[root].key > *key {
			return None
		}
		if self.nodes[root].key == *key {
			return Some(root)
		}
		let mut rings = VecDeque::new();
		rings.extend(self.nodes[root].child);
		while let Some(first) = rings.pop_front() {
			let mut cur = first;
			loop {
				if self.nodes[cur].key == *key {
					return Some(cur)
				}
				if self.nodes[cur].key < *key {
					rings.extend(self.nodes[cur].child);
				}
				cur = self.nodes[cur].right;
				if cur == first {
					break
				}
			}
		}
		None
	}
}

impl<K: Ord + fmt::Debug> MeldableHeap<K> for FibHeap<K> {
	type Handle = Handle;

	fn new() -> Self {
		Self::default()
	}

	fn len(&self) -> usize {
		self.nodes.len()
	}

	/// O(1): splice a singleton into the root ring next to `min`
	fn insert(&mut self, key: K) -> Handle {
		let n = self.nodes.alloc(FibNode{
			key, parent: None, child: None, left: 0, right: 0, degree: 0, mark: false
		});
		self.ring_insert(self.min, n);
		if self.min.map_or(true, |m| self.nodes[n].key < self.nodes[m].key) {
			self.min = Some(n);
		}
		#[cfg(test)] {
			assert_eq!(self.check(), Ok(()));
		}
		self.nodes.handle(n)
	}

	fn minimum(&self) -> Result<&K, HeapError> {
		self.min.map(|m| &self.nodes[m].key).ok_or(HeapError::EmptyHeap)
	}

	/// O(log n) amortized: the root-ring scan is paid for by the potential
	/// released as trees merge during consolidation
	fn extract_min(&mut self) -> Result<K, HeapError> {
		let m = self.min.ok_or(HeapError::EmptyHeap)?;
		// every child of the minimum becomes a root
		if let Some(first) = self.nodes[m].child.take() {
			let mut cur = first;
			loop {
				let next = self.nodes[cur].right;
				self.nodes[cur].parent = None;
				self.nodes[cur].mark = false;
				self.ring_insert(Some(m), cur);
				if next == first {
					break
				}
				cur = next;
			}
		}
		match self.ring_remove(m) {
			None => self.min = None,
			Some(r) => {
				// provisional entry point; consolidation finds the true min
				self.min = Some(r);
				self.consolidate();
			}
		}
		let node = self.nodes.free(m);
		#[cfg(test)] {
			assert_eq!(self.check(), Ok(()));
		}
		Ok(node.key)
	}

	/// O(1): one ring splice joins the root rings, one comparison fixes
	/// `min`.  No consolidation; equal root degrees are tolerated until the
	/// next extraction.  Adopting `other`'s node storage into our arena is
	/// a block move, after which `other`'s handles resolve against `self`.
	fn merge(&mut self, other: Self) {
		let FibHeap{nodes, min} = other;
		let Some(om) = min else { return };
		let off = self.nodes.absorb(nodes, |node, off| {
			node.left += off;
			node.right += off;
			if let Some(p) = node.parent.as_mut() {
				*p += off;
			}
			if let Some(c) = node.child.as_mut() {
				*c += off;
			}
		});
		let om = om + off;
		match self.min {
			None => self.min = Some(om),
			Some(m) => {
				let a = self.nodes[m].left;
				let b = self.nodes[om].left;
				self.nodes[a].right = om;
				self.nodes[om].left = a;
				self.nodes[b].right = m;
				self.nodes[m].left = b;
				if self.nodes[om].key < self.nodes[m].key {
					self.min = Some(om);
				}
			}
		}
		#[cfg(test)] {
			assert_eq!(self.check(), Ok(()));
		}
	}

	/// O(1) amortized.  Heap-order violations are repaired by cutting the
	/// node into the root ring and cascading-cutting its ancestors, never
	/// by sifting.
	fn decrease_key(&mut self, h: &Handle, new_key: K) -> Result<(), HeapError> {
		let n = self.nodes.lookup(h).ok_or(HeapError::NotFound)?;
		if new_key > self.nodes[n].key {
			return Err(HeapError::InvalidDecrease)
		}
		self.nodes[n].key = new_key;
		if let Some(p) = self.nodes[n].parent {
			if self.nodes[n].key < self.nodes[p].key {
				self.cut(n, p);
				self.cascading_cut(p);
			}
		}
		let m = self.min.unwrap();
		if self.nodes[n].key < self.nodes[m].key {
			self.min = Some(n);
		}
		#[cfg(test)] {
			assert_eq!(self.check(), Ok(()));
		}
		Ok(())
	}

	/// Float the doomed key to the root of its tree by swapping it with
	/// each parent key in turn (an unbounded decrease without a sentinel
	/// value), then extract at that root.  Keys along the swap path shift
	/// down one node each, so handles into the path afterwards refer to the
	/// shifted keys; the slot actually freed is the tree's old root.
	fn delete(&mut self, h: &Handle) -> Result<(), HeapError> {
		let mut n = self.nodes.lookup(h).ok_or(HeapError::NotFound)?;
		while let Some(p) = self.nodes[n].parent {
			let (a, b) = self.nodes.get2_mut(n, p);
			std::mem::swap(&mut a.key, &mut b.key);
			n = p;
		}
		self.min = Some(n);
		self.extract_min().map(|_| ())
	}

	/// O(n) worst case: root ring in order from `min`, breadth-first within
	/// each tree.  First match in that traversal order wins among
	/// duplicates.
	fn find(&self, key: &K) -> Result<Handle, HeapError> {
		let start = self.min.ok_or(HeapError::NotFound)?;
		let mut root = start;
		loop {
			if let Some(n) = self.search_tree(root, key) {
				return Ok(self.nodes.handle(n))
			}
			root = self.nodes[root].right;
			if root == start {
				return Err(HeapError::NotFound)
			}
		}
	}

	fn dump(&self) -> String {
		let mut out = String::new();
		let Some(start) = self.min else { return out };
		let mut root = start;
		loop {
			let _ = write!(out, "B({}) = {:?}", self.nodes[root].degree, self.nodes[root].key);
			// level order below the root, one parenthesized group per
			// child ring, members annotated with their parent's key
			let mut rings = VecDeque::new();
			rings.extend(self.nodes[root].child);
			while let Some(first) = rings.pop_front() {
				out.push_str(" (");
				let mut cur = first;
				loop {
					let _ = write!(out, " {:?}", self.nodes[cur].key);
					if let Some(p) = self.nodes[cur].parent {
						let _ = write!(out, "[{:?}]", self.nodes[p].key);
					}
					rings.extend(self.nodes[cur].child);
					cur = self.nodes[cur].right;
					if cur == first {
						break
					}
				}
				out.push_str(" )");
			}
			out.push('\n');
			root = self.nodes[root].right;
			if root == start {
				break
			}
		}
		out
	}
}

#[cfg(test)]
#[derive(Debug, PartialEq, Eq)]
enum FibCheckError {
	BrokenRing(u32),
	LessThanParent(u32),
	BrokenParentLink(u32),
	WrongDegree(u32),
	MarkedRoot(u32),
	MinNotSmallest(u32),
	WrongCount
}

#[cfg(test)]
impl<K: Ord> FibHeap<K> {
	/// Validate every structural invariant reachable from the root ring.
	/// O(n), asserted after each mutation in tests; the stress_tests
	/// feature skips it so large randomized runs stay usable.
	fn check(&self) -> Result<(), FibCheckError> {
		use FibCheckError::*;
		let Some(min) = self.min else {
			return if self.nodes.is_empty() { Ok(()) } else { Err(WrongCount) }
		};
		#[cfg(feature = "stress_tests")] {
			return Ok(())
		}
		let mut count = 0;
		let mut root = min;
		loop {
			if self.nodes[root].parent.is_some() {
				return Err(BrokenParentLink(root))
			}
			if self.nodes[root].mark {
				return Err(MarkedRoot(root))
			}
			if self.nodes[root].key < self.nodes[min].key {
				return Err(MinNotSmallest(root))
			}
			count += self.check_tree(root)?;
			root = self.nodes[root].right;
			if self.nodes[self.nodes[root].left].right != root {
				return Err(BrokenRing(root))
			}
			if root == min {
				break
			}
		}
		if count != self.nodes.len() {
			return Err(WrongCount)
		}
		Ok(())
	}

	fn check_tree(&self, n: u32) -> Result<usize, FibCheckError> {
		use FibCheckError::*;
		let mut count = 1;
		let mut degree = 0;
		if let Some(first) = self.nodes[n].child {
			let mut cur = first;
			loop {
				if self.nodes[cur].parent != Some(n) {
					return Err(BrokenParentLink(cur))
				}
				if self.nodes[cur].key < self.nodes[n].key {
					return Err(LessThanParent(cur))
				}
				let right = self.nodes[cur].right;
				if self.nodes[right].left != cur {
					return Err(BrokenRing(cur))
				}
				degree += 1;
				count += self.check_tree(cur)?;
				cur = right;
				if cur == first {
					break
				}
			}
		}
		if degree != self.nodes[n].degree {
			return Err(WrongDegree(n))
		}
		Ok(count)
	}

	/// Binomial property: holds immediately after extract_min, not in
	/// general
	fn root_degrees_distinct(&self) -> bool {
		let Some(start) = self.min else { return true };
		let mut seen = std::collections::HashSet::new();
		let mut root = start;
		loop {
			if !seen.insert(self.nodes[root].degree) {
				return false
			}
			root = self.nodes[root].right;
			if root == start {
				return true
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::FibHeap;
	use crate::{HeapError, MeldableHeap};

	#[test]
	fn insert_tracks_minimum() {
		let mut heap = FibHeap::new();
		for k in [5, 3, 8, 1] {
			heap.insert(k);
		}
		assert_eq!(heap.len(), 4);
		assert_eq!(heap.minimum(), Ok(&1));
	}

	#[test]
	fn extract_restores_binomial_property() {
		let mut heap = FibHeap::new();
		for k in [1, 3, 5, 8] {
			heap.insert(k);
		}
		assert_eq!(heap.extract_min(), Ok(1));
		assert_eq!(heap.minimum(), Ok(&3));
		assert!(heap.root_degrees_distinct());
		assert_eq!(heap.extract_min(), Ok(3));
		assert!(heap.root_degrees_distinct());
	}

	#[test]
	fn empty_heap_errors() {
		let mut heap = FibHeap::<i32>::new();
		assert_eq!(heap.minimum(), Err(HeapError::EmptyHeap));
		assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap));
		assert!(heap.is_empty());
		assert_eq!(heap.dump(), "");
	}

	#[test]
	fn decrease_key_moves_min() {
		let mut heap = FibHeap::new();
		heap.insert(10);
		heap.insert(20);
		let h = heap.insert(30);
		assert_eq!(heap.decrease_key(&h, 5), Ok(()));
		assert_eq!(heap.minimum(), Ok(&5));
	}

	#[test]
	fn decrease_key_rejects_increase() {
		let mut heap = FibHeap::new();
		heap.insert(10);
		let h = heap.insert(20);
		assert_eq!(heap.decrease_key(&h, 21), Err(HeapError::InvalidDecrease));
		// failed call leaves the heap unchanged
		assert_eq!(heap.minimum(), Ok(&10));
		assert_eq!(heap.decrease_key(&h, 20), Ok(()));
		assert_eq!(heap.len(), 2);
	}

	#[test]
	fn decrease_key_cuts_under_consolidated_tree() {
		let mut heap = FibHeap::new();
		let handles: Vec<_> = (0..16).map(|k| heap.insert(k)).collect();
		// consolidating leaves one binomial tree of degree 4 rooted at 0
		assert_eq!(heap.extract_min(), Ok(0));
		// force cuts deep in the remaining tree, cascading included
		for h in handles.iter().rev().take(8) {
			if let Ok(()) = heap.decrease_key(h, -1) {
				assert_eq!(heap.minimum(), Ok(&-1));
				break
			}
		}
		let mut prev = i32::MIN;
		while let Ok(k) = heap.extract_min() {
			assert!(k >= prev);
			prev = k;
		}
	}

	#[test]
	fn stale_and_foreign_handles() {
		let mut heap = FibHeap::new();
		let h1 = heap.insert(1);
		heap.insert(2);
		assert_eq!(heap.extract_min(), Ok(1));
		assert_eq!(heap.decrease_key(&h1, 0), Err(HeapError::NotFound));
		assert_eq!(heap.delete(&h1), Err(HeapError::NotFound));
		let mut stranger = FibHeap::new();
		let hs = stranger.insert(7);
		assert_eq!(heap.decrease_key(&hs, 0), Err(HeapError::NotFound));
	}

	#[test]
	fn merge_is_a_ring_splice() {
		let mut a = FibHeap::new();
		for k in [1, 4, 7] {
			a.insert(k);
		}
		let mut b = FibHeap::new();
		for k in [2, 5, 8] {
			b.insert(k);
		}
		let hb = b.insert(50);
		a.merge(b);
		assert_eq!(a.len(), 7);
		// handles minted by the absorbed heap keep working
		assert_eq!(a.decrease_key(&hb, 0), Ok(()));
		assert_eq!(a.extract_min(), Ok(0));
		for expect in [1, 2, 4, 5, 7, 8] {
			assert_eq!(a.extract_min(), Ok(expect));
		}
		assert!(a.is_empty());
	}

	#[test]
	fn merge_with_empty() {
		let mut a = FibHeap::new();
		a.insert(3);
		a.merge(FibHeap::new());
		assert_eq!(a.len(), 1);
		let mut empty = FibHeap::new();
		let mut b = FibHeap::new();
		b.insert(2);
		empty.merge(b);
		assert_eq!(empty.minimum(), Ok(&2));
	}

	#[test]
	fn delete_inner_node() {
		let mut heap = FibHeap::new();
		for k in 0..10 {
			heap.insert(k);
		}
		assert_eq!(heap.extract_min(), Ok(0));
		// 5 now sits inside a consolidated tree
		let h = heap.find(&5).unwrap();
		assert_eq!(heap.delete(&h), Ok(()));
		assert_eq!(heap.len(), 8);
		for expect in [1, 2, 3, 4, 6, 7, 8, 9] {
			assert_eq!(heap.extract_min(), Ok(expect));
		}
	}

	#[test]
	fn find_misses_and_duplicates() {
		let mut heap = FibHeap::new();
		assert_eq!(heap.find(&1), Err(HeapError::NotFound));
		for k in [9, 1, 1, 1] {
			heap.insert(k);
		}
		assert_eq!(heap.find(&4), Err(HeapError::NotFound));
		let h = heap.find(&1).unwrap();
		assert_eq!(heap.delete(&h), Ok(()));
		assert_eq!(heap.extract_min(), Ok(1));
		assert_eq!(heap.extract_min(), Ok(1));
		assert_eq!(heap.extract_min(), Ok(9));
		assert!(heap.is_empty());
	}

	#[test]
	fn dump_lists_every_root() {
		let mut heap = FibHeap::new();
		for k in [4, 2, 9, 7] {
			heap.insert(k);
		}
		assert_eq!(heap.extract_min(), Ok(2));
		let listing = heap.dump();
		// one consolidated tree plus a leftover, all keys present
		assert!(listing.contains("B("));
		for k in ["4", "7", "9"] {
			assert!(listing.contains(k), "{} missing from {}", k, listing);
		}
	}

	// Incremental sieve keyed on (next multiple, prime): a workload that
	// interleaves inserts and extractions with composite keys.
	#[test]
	fn prime_sieve() {
		let ub = 100u64;
		let mut sum = 0;
		let mut heap = FibHeap::new();
		for n in 2..ub {
			while let Ok(&(multiple, prime)) = heap.minimum() {
				if multiple >= n {
					break
				}
				heap.extract_min().unwrap();
				if multiple + prime < ub {
					heap.insert((multiple + prime, prime));
				}
			}
			if heap.minimum().map_or(true, |&(multiple, _)| multiple != n) {
				sum += n;
				if n * n < ub {
					heap.insert((n * n, n));
				}
			}
		}
		assert_eq!(sum, 1060);
	}
}
