pub mod arena;
pub mod binheap;
pub mod bheap;
pub mod lheap;
pub mod fheap;

use std::fmt;



/// Error kinds shared by every heap variant.
/// All of these are recoverable: a failed call leaves the heap unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// `minimum` or `extract_min` was called on an empty heap
    EmptyHeap,
    /// `decrease_key` was asked to increase a key
    InvalidDecrease,
    /// `find` missed, or a handle was stale or belonged to an unrelated heap
    NotFound
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::EmptyHeap => write!(f, "heap is empty"),
            HeapError::InvalidDecrease => write!(f, "new key is greater than the current key"),
            HeapError::NotFound => write!(f, "no live node matches the given key or handle")
        }
    }
}

impl std::error::Error for HeapError {}



/// The operation surface shared by all four heap variants, so a single
/// property suite can exercise them identically.
///
/// A `Handle` is a stable reference to a node, valid until that node is
/// extracted or deleted.  Passing a stale handle, or a handle minted by an
/// unrelated heap, fails with [`HeapError::NotFound`].  Handles minted by a
/// heap that has since been merged into another remain valid against the
/// merged heap.
pub trait MeldableHeap<K: Ord>: Default {
    type Handle: Clone + PartialEq + Eq;

    fn new() -> Self;

    /// Number of live nodes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a key, returning a handle usable later with
    /// [`decrease_key`](Self::decrease_key) and [`delete`](Self::delete)
    fn insert(&mut self, key: K) -> Self::Handle;

    /// The smallest key, without removing it
    fn minimum(&self) -> Result<&K, HeapError>;

    /// Remove and return the smallest key
    fn extract_min(&mut self) -> Result<K, HeapError>;

    /// Move every node of `other` into `self`.  `other` is consumed, so it is
    /// trivially empty afterwards; its nodes' handles stay valid against `self`.
    fn merge(&mut self, other: Self);

    /// Lower the key of the node `h` refers to.  `new_key` equal to the current
    /// key is accepted as a no-op; a greater key fails with
    /// [`HeapError::InvalidDecrease`] and changes nothing.
    fn decrease_key(&mut self, h: &Self::Handle, new_key: K) -> Result<(), HeapError>;

    /// Remove the node `h` refers to, whatever its key
    fn delete(&mut self, h: &Self::Handle) -> Result<(), HeapError>;

    /// Handle of some node holding `key`.  Linear in the worst case for every
    /// variant: heap order gives no total order to search by.  Ties resolve to
    /// the first match in the variant's fixed traversal order.
    fn find(&self, key: &K) -> Result<Self::Handle, HeapError>;

    /// Human-readable structural listing, one line per tree.  A debug aid; the
    /// exact format is not a stable interface.
    fn dump(&self) -> String;
}
