use std::fmt;
use std::fmt::Write;

use crate::arena::{Arena, Handle};
use crate::{HeapError, MeldableHeap};

/// An implicit array min-heap with stable handles.
///
/// The classic formulation hands out raw interior pointers, which the
/// backing vector invalidates on every reallocation and swap; here each
/// element instead carries a slot id in a generational arena that maps
/// slot -> current array position, updated on every swap.  Insert and
/// decrease-key sift up, extract sifts down, merge appends and re-heapifies
/// bottom-up.
pub struct BinHeap<K> {
    /// Key plus the slot id tracking its position
    data: Vec<(K, u32)>,
    /// slot id -> index into `data`
    slots: Arena<u32>
}

impl<K> Default for BinHeap<K> {
    fn default() -> Self {
        Self{data: Vec::new(), slots: Arena::new()}
    }
}

impl<K: Ord> BinHeap<K> {
    /// Swap two elements, keeping the slot map honest
    fn swap_cells(&mut self, i: usize, j: usize) {
        self.data.swap(i, j);
        let si = self.data[i].1;
        let sj = self.data[j].1;
        self.slots[si] = i as u32;
        self.slots[sj] = j as u32;
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.data[parent].0 <= self.data[i].0
                { break }
            self.swap_cells(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let mut smallest = i;
            for child in [2*i + 1, 2*i + 2] {
                if child < self.data.len() && self.data[child].0 < self.data[smallest].0
                    { smallest = child }
            }
            if smallest == i
                { break }
            self.swap_cells(i, smallest);
            i = smallest;
        }
    }

    /// Floyd's bottom-up heap construction, O(n)
    fn heapify(&mut self) {
        for i in (0..self.data.len() / 2).rev() {
            self.sift_down(i);
        }
    }
}

impl<K: Ord + fmt::Debug> MeldableHeap<K> for BinHeap<K> {
    type Handle = Handle;

    fn new() -> Self {
        Self::default()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn insert(&mut self, key: K) -> Handle {
        let s = self.slots.alloc(self.data.len() as u32);
        self.data.push((key, s));
        self.sift_up(self.data.len() - 1);
        self.slots.handle(s)
    }

    fn minimum(&self) -> Result<&K, HeapError> {
        self.data.first().map(|(k, _)| k).ok_or(HeapError::EmptyHeap)
    }

    fn extract_min(&mut self) -> Result<K, HeapError> {
        if self.data.is_empty() {
            return Err(HeapError::EmptyHeap)
        }
        let last = self.data.len() - 1;
        self.swap_cells(0, last);
        let (key, s) = self.data.pop().unwrap();
        self.slots.free(s);
        if !self.data.is_empty() {
            self.sift_down(0);
        }
        Ok(key)
    }

    /// Append and re-heapify: O(n + m), as in the array constructor.
    /// Handles minted by `other` stay valid through the slot-map adoption.
    fn merge(&mut self, other: Self) {
        let BinHeap{data, slots} = other;
        let pos_off = self.data.len() as u32;
        let slot_off = self.slots.absorb(slots, |pos, _| *pos += pos_off);
        for (key, s) in data {
            self.data.push((key, s + slot_off));
        }
        self.heapify();
    }

    fn decrease_key(&mut self, h: &Handle, new_key: K) -> Result<(), HeapError> {
        let s = self.slots.lookup(h).ok_or(HeapError::NotFound)?;
        let pos = self.slots[s] as usize;
        if new_key > self.data[pos].0 {
            return Err(HeapError::InvalidDecrease)
        }
        self.data[pos].0 = new_key;
        self.sift_up(pos);
        Ok(())
    }

    fn delete(&mut self, h: &Handle) -> Result<(), HeapError> {
        let s = self.slots.lookup(h).ok_or(HeapError::NotFound)?;
        let pos = self.slots[s] as usize;
        let last = self.data.len() - 1;
        self.swap_cells(pos, last);
        let (_, s) = self.data.pop().unwrap();
        self.slots.free(s);
        if pos < self.data.len() {
            // the replacement may need to move either direction
            self.sift_down(pos);
            self.sift_up(pos);
        }
        Ok(())
    }

    /// Array scan in index order; deterministic first match on duplicates
    fn find(&self, key: &K) -> Result<Handle, HeapError> {
        for (k, s) in &self.data {
            if k == key {
                return Ok(self.slots.handle(*s))
            }
        }
        Err(HeapError::NotFound)
    }

    /// One tree level per line
    fn dump(&self) -> String {
        let mut out = String::new();
        let mut i = 0;
        let mut width = 1;
        while i < self.data.len() {
            let end = (i + width).min(self.data.len());
            for (k, _) in &self.data[i..end] {
                let _ = write!(out, " {:?}", k);
            }
            out.push('\n');
            i = end;
            width *= 2;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::BinHeap;
    use crate::{HeapError, MeldableHeap};

    fn check<K: Ord>(heap: &BinHeap<K>) {
        for i in 1..heap.data.len() {
            assert!(heap.data[(i - 1) / 2].0 <= heap.data[i].0, "heap order broken at {}", i);
        }
        for (i, &(_, s)) in heap.data.iter().enumerate() {
            assert_eq!(heap.slots[s] as usize, i, "slot map out of sync at {}", i);
        }
    }

    #[test]
    fn heap_sort() {
        let mut heap = BinHeap::new();
        for k in [5, 3, 8, 1, 9, 2, 7] {
            heap.insert(k);
            check(&heap);
        }
        assert_eq!(heap.minimum(), Ok(&1));
        let mut drained = Vec::new();
        while let Ok(k) = heap.extract_min() {
            check(&heap);
            drained.push(k);
        }
        assert_eq!(drained, [1, 2, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn handles_survive_sifting() {
        let mut heap = BinHeap::new();
        let handles: Vec<_> = [50, 40, 30, 20, 10].iter().map(|&k| heap.insert(k)).collect();
        // the node that held 50 has been swapped away from position 0
        assert_eq!(heap.decrease_key(&handles[0], 5), Ok(()));
        check(&heap);
        assert_eq!(heap.minimum(), Ok(&5));
        assert_eq!(heap.decrease_key(&handles[0], 6), Err(HeapError::InvalidDecrease));
        assert_eq!(heap.delete(&handles[2]), Ok(()));
        check(&heap);
        let mut drained = Vec::new();
        while let Ok(k) = heap.extract_min() {
            drained.push(k);
        }
        assert_eq!(drained, [5, 10, 20, 40]);
    }

    #[test]
    fn merge_reheapifies() {
        let mut a = BinHeap::new();
        for k in [1, 4, 7] {
            a.insert(k);
        }
        let mut b = BinHeap::new();
        for k in [2, 5, 8] {
            b.insert(k);
        }
        let hb = b.insert(3);
        a.merge(b);
        check(&a);
        assert_eq!(a.len(), 7);
        assert_eq!(a.delete(&hb), Ok(()));
        for expect in [1, 2, 4, 5, 7, 8] {
            assert_eq!(a.extract_min(), Ok(expect));
        }
    }

    #[test]
    fn find_in_index_order() {
        let mut heap = BinHeap::new();
        for k in [9, 1, 1, 1] {
            heap.insert(k);
        }
        assert_eq!(heap.find(&4), Err(HeapError::NotFound));
        let h = heap.find(&1).unwrap();
        // index order makes this the 1 sitting at the root
        assert_eq!(heap.slots[heap.slots.lookup(&h).unwrap()], 0);
        assert_eq!(heap.delete(&h), Ok(()));
        assert_eq!(heap.len(), 3);
    }
}
