use std::fmt;
use std::fmt::Write;

use crate::arena::{Arena, Handle};
use crate::{HeapError, MeldableHeap};

/// One node of a leftist tree.  `s` is the null-path length (1 for a node
/// with a missing child); the leftist invariant `s(left) >= s(right)`
/// keeps the right spine O(log n) long.
struct LeftNode<K> {
	key: K,
	left: Option<u32>,
	right: Option<u32>,
	parent: Option<u32>,
	s: u32
}

/// A leftist heap: a single heap-ordered binary tree whose every operation
/// reduces to melding along the short right spine.
///
/// insert melds a singleton, extract-min melds the root's children, and
/// merging two heaps melds their roots, all O(log n).  Parent links exist
/// only to serve decrease-key (cut the subtree, repair s-values upward,
/// meld it back) and delete (replace the node by the meld of its
/// children).
pub struct LeftistHeap<K> {
	nodes: Arena<LeftNode<K>>,
	root: Option<u32>
}

impl<K> Default for LeftistHeap<K> {
	fn default() -> Self {
		Self{nodes: Arena::new(), root: None}
	}
}

impl<K: Ord> LeftistHeap<K> {
	/// Meld two trees: the smaller root wins (ties keep `a`), the loser
	/// melds into the winner's right subtree, and the children swap if the
	/// result breaks the leftist invariant.  Recursion depth is the right
	/// spine, O(log n).  The returned root's parent link is only cleared
	/// on the path that compared roots, so callers installing the result
	/// re-clear or re-point it.
	fn meld(&mut self, a: Option<u32>, b: Option<u32>) -> Option<u32> {
		let (a, b) = match (a, b) {
			(None, x) => return x,
			(x, None) => return x,
			(Some(a), Some(b)) => (a, b)
		};
		let (root, child) = if self.nodes[b].key < self.nodes[a].key { (b, a) } else { (a, b) };
		// melding Some into the right subtree always yields Some
		let melded = self.meld(self.nodes[root].right, Some(child)).unwrap();
		self.nodes[root].right = Some(melded);
		self.nodes[root].parent = None;
		self.nodes[melded].parent = Some(root);
		if self.nodes[root].left.is_none() {
			self.nodes[root].left = self.nodes[root].right.take();
			self.nodes[root].s = 1;
		} else {
			let l = self.nodes[root].left.unwrap();
			if self.nodes[l].s < self.nodes[melded].s {
				self.nodes[root].left = Some(melded);
				self.nodes[root].right = Some(l);
			}
			let r = self.nodes[root].right.unwrap();
			self.nodes[root].s = self.nodes[r].s + 1;
		}
		Some(root)
	}

	/// After a subtree was removed or replaced below `cur`, walk up
	/// restoring the leftist invariant and s-values, stopping at the first
	/// ancestor whose s-value comes out unchanged
	fn repair_upward(&mut self, mut cur: Option<u32>) {
		while let Some(n) = cur {
			let old_s = self.nodes[n].s;
			if self.nodes[n].left.is_none() {
				// a lone right child moves over to the left
				self.nodes[n].left = self.nodes[n].right.take();
				self.nodes[n].s = 1;
			} else if self.nodes[n].right.is_none() {
				self.nodes[n].s = 1;
			} else {
				let l = self.nodes[n].left.unwrap();
				let r = self.nodes[n].right.unwrap();
				if self.nodes[l].s < self.nodes[r].s {
					self.nodes[n].left = Some(r);
					self.nodes[n].right = Some(l);
				}
				let r = self.nodes[n].right.unwrap();
				self.nodes[n].s = self.nodes[r].s + 1;
			}
			if self.nodes[n].s == old_s {
				break
			}
			cur = self.nodes[n].parent;
		}
	}
}

impl<K: Ord + fmt::Debug> MeldableHeap<K> for LeftistHeap<K> {
	type Handle = Handle;

	fn new() -> Self {
		Self::default()
	}

	fn len(&self) -> usize {
		self.nodes.len()
	}

	fn insert(&mut self, key: K) -> Handle {
		let n = self.nodes.alloc(LeftNode{key, left: None, right: None, parent: None, s: 1});
		self.root = self.meld(self.root, Some(n));
		self.nodes.handle(n)
	}

	/// The root is the minimum
	fn minimum(&self) -> Result<&K, HeapError> {
		self.root.map(|r| &self.nodes[r].key).ok_or(HeapError::EmptyHeap)
	}

	fn extract_min(&mut self) -> Result<K, HeapError> {
		let r = self.root.ok_or(HeapError::EmptyHeap)?;
		let (l, rt) = (self.nodes[r].left.take(), self.nodes[r].right.take());
		self.root = self.meld(l, rt);
		if let Some(nr) = self.root {
			self.nodes[nr].parent = None;
		}
		let node = self.nodes.free(r);
		Ok(node.key)
	}

	fn merge(&mut self, other: Self) {
		let LeftistHeap{nodes, root} = other;
		let Some(or) = root else { return };
		let off = self.nodes.absorb(nodes, |node, off| {
			if let Some(x) = node.left.as_mut() {
				*x += off;
			}
			if let Some(x) = node.right.as_mut() {
				*x += off;
			}
			if let Some(x) = node.parent.as_mut() {
				*x += off;
			}
		});
		self.root = self.meld(self.root, Some(or + off));
		if let Some(nr) = self.root {
			self.nodes[nr].parent = None;
		}
	}

	/// Cut the node's whole subtree loose, repair s-values up the old
	/// ancestor chain, and meld the subtree back with the root
	fn decrease_key(&mut self, h: &Handle, new_key: K) -> Result<(), HeapError> {
		let n = self.nodes.lookup(h).ok_or(HeapError::NotFound)?;
		if new_key > self.nodes[n].key {
			return Err(HeapError::InvalidDecrease)
		}
		self.nodes[n].key = new_key;
		let Some(p) = self.nodes[n].parent.take() else {
			return Ok(())
		};
		if self.nodes[p].left == Some(n) {
			self.nodes[p].left = None;
		} else {
			self.nodes[p].right = None;
		}
		self.repair_upward(Some(p));
		self.root = self.meld(self.root, Some(n));
		if let Some(nr) = self.root {
			self.nodes[nr].parent = None;
		}
		Ok(())
	}

	/// Replace the node by the meld of its children; the freed slot is the
	/// node itself, so this handle's node really goes away
	fn delete(&mut self, h: &Handle) -> Result<(), HeapError> {
		let n = self.nodes.lookup(h).ok_or(HeapError::NotFound)?;
		let (l, rt) = (self.nodes[n].left.take(), self.nodes[n].right.take());
		let sub = self.meld(l, rt);
		match self.nodes[n].parent {
			None => {
				self.root = sub;
				if let Some(s) = sub {
					self.nodes[s].parent = None;
				}
			},
			Some(p) => {
				if self.nodes[p].left == Some(n) {
					self.nodes[p].left = sub;
				} else {
					self.nodes[p].right = sub;
				}
				if let Some(s) = sub {
					self.nodes[s].parent = Some(p);
				}
				self.repair_upward(Some(p));
			}
		}
		self.nodes.free(n);
		Ok(())
	}

	/// Inorder walk (explicit stack), pruning subtrees whose root already
	/// exceeds `key`
	fn find(&self, key: &K) -> Result<Handle, HeapError> {
		let mut stack = Vec::new();
		let mut cur = self.root;
		loop {
			while let Some(n) = cur {
				if self.nodes[n].key > *key {
					cur = None;
				} else {
					stack.push(n);
					cur = self.nodes[n].left;
				}
			}
			let Some(n) = stack.pop() else {
				return Err(HeapError::NotFound)
			};
			if self.nodes[n].key == *key {
				return Ok(self.nodes.handle(n))
			}
			cur = self.nodes[n].right;
		}
	}

	fn dump(&self) -> String {
		let mut out = String::new();
		if let Some(r) = self.root {
			let _ = write!(out, "B({}) =", self.nodes[r].s);
			self.dump_preorder(r, &mut out);
			out.push('\n');
		}
		out
	}
}

impl<K: Ord + fmt::Debug> LeftistHeap<K> {
	fn dump_preorder(&self, n: u32, out: &mut String) {
		let _ = write!(out, " {:?}", self.nodes[n].key);
		if self.nodes[n].left.is_some() || self.nodes[n].right.is_some() {
			out.push_str(" (");
			if let Some(l) = self.nodes[n].left {
				self.dump_preorder(l, out);
			} else {
				out.push_str(" _");
			}
			if let Some(r) = self.nodes[n].right {
				self.dump_preorder(r, out);
			} else {
				out.push_str(" _");
			}
			out.push_str(" )");
		}
	}
}

#[cfg(test)]
impl<K: Ord> LeftistHeap<K> {
	fn check(&self) {
		let count = match self.root {
			None => 0,
			Some(r) => {
				assert!(self.nodes[r].parent.is_none());
				self.check_tree(r)
			}
		};
		assert_eq!(count, self.nodes.len(), "unreachable or duplicated nodes");
	}

	fn check_tree(&self, n: u32) -> usize {
		let ls = self.nodes[n].left.map_or(0, |l| self.nodes[l].s);
		let rs = self.nodes[n].right.map_or(0, |r| self.nodes[r].s);
		assert!(ls >= rs, "leftist invariant broken");
		assert_eq!(self.nodes[n].s, rs + 1, "stale s-value");
		let mut count = 1;
		for c in [self.nodes[n].left, self.nodes[n].right].into_iter().flatten() {
			assert_eq!(self.nodes[c].parent, Some(n));
			assert!(self.nodes[c].key >= self.nodes[n].key, "heap order broken");
			count += self.check_tree(c);
		}
		count
	}
}
