use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(0);

/// A stable, generation-checked reference to one node of one heap.
///
/// Internally the linked heaps address their nodes with plain `u32` slot
/// indices; a `Handle` additionally records which arena minted it and the
/// slot's generation at mint time, so resolving a handle against a heap can
/// detect staleness (the slot was freed, maybe reused) and foreignness (the
/// handle came from an unrelated heap) instead of silently touching the
/// wrong node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
	arena: u64,
	gen: u32,
	slot: u32
}

enum Entry<T> {
	Occupied(T),
	/// Next slot in the free list
	Vacant(Option<u32>)
}

struct Slot<T> {
	gen: u32,
	entry: Entry<T>
}

/// Growable slot store owning every node of a heap.
///
/// Tree structure (parent/child/sibling links) is expressed as `u32` indices
/// into this arena, never as owning pointers, so the cyclic rings of the
/// fibonacci heap and the parent backlinks of the other variants need no
/// shared ownership and every node is freed exactly once.
///
/// Freed slots go on an intrusive free list and are reused by later
/// allocations; each reuse bumps the slot's generation, invalidating old
/// handles.  [`Arena::absorb`] adopts another arena wholesale (for heap
/// melding) while keeping the absorbed arena's outstanding handles usable:
/// a lineage table records, per absorbed arena id, the offset its slots
/// landed at.
pub struct Arena<T> {
	slots: Vec<Slot<T>>,
	free_head: Option<u32>,
	len: usize,
	id: u64,
	lineage: HashMap<u64, u32>
}

impl<T> Default for Arena<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Arena<T> {
	pub fn new() -> Self {
		let id = NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed);
		Self{slots: Vec::new(), free_head: None, len: 0, id, lineage: HashMap::from([(id, 0)])}
	}

	/// Number of occupied slots
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Store a value, reusing a freed slot if one is available
	pub fn alloc(&mut self, value: T) -> u32 {
		self.len += 1;
		match self.free_head {
			Some(i) => {
				let slot = &mut self.slots[i as usize];
				self.free_head = match slot.entry {
					Entry::Vacant(next) => next,
					Entry::Occupied(_) => unreachable!("occupied slot on the free list")
				};
				slot.entry = Entry::Occupied(value);
				i
			},
			None => {
				self.slots.push(Slot{gen: 0, entry: Entry::Occupied(value)});
				(self.slots.len() - 1) as u32
			}
		}
	}

	/// Release slot `i`, returning its value.  The slot's generation is
	/// bumped so outstanding handles to it stop resolving.
	pub fn free(&mut self, i: u32) -> T {
		let slot = &mut self.slots[i as usize];
		match std::mem::replace(&mut slot.entry, Entry::Vacant(self.free_head)) {
			Entry::Occupied(value) => {
				slot.gen = slot.gen.wrapping_add(1);
				self.free_head = Some(i);
				self.len -= 1;
				value
			},
			Entry::Vacant(_) => unreachable!("double free of arena slot")
		}
	}

	/// Mint a handle for the live slot `i`
	pub fn handle(&self, i: u32) -> Handle {
		Handle{arena: self.id, gen: self.slots[i as usize].gen, slot: i}
	}

	/// Resolve a handle to a slot index, or `None` if the handle is stale or
	/// was minted by an arena unrelated to this one
	pub fn lookup(&self, h: &Handle) -> Option<u32> {
		let off = *self.lineage.get(&h.arena)?;
		let i = h.slot.checked_add(off)?;
		let slot = self.slots.get(i as usize)?;
		match slot.entry {
			Entry::Occupied(_) if slot.gen == h.gen => Some(i),
			_ => None
		}
	}

	/// Mutable references to two distinct live slots at once
	pub fn get2_mut(&mut self, i: u32, j: u32) -> (&mut T, &mut T) {
		assert_ne!(i, j, "get2_mut needs distinct slots");
		let (lo, hi, flipped) = if i < j { (i, j, false) } else { (j, i, true) };
		let (head, tail) = self.slots.split_at_mut(hi as usize);
		let a = match &mut head[lo as usize].entry {
			Entry::Occupied(value) => value,
			Entry::Vacant(_) => unreachable!("get2_mut on vacant slot")
		};
		let b = match &mut tail[0].entry {
			Entry::Occupied(value) => value,
			Entry::Vacant(_) => unreachable!("get2_mut on vacant slot")
		};
		if flipped { (b, a) } else { (a, b) }
	}

	/// Adopt every slot of `other`, returning the offset its slots landed at.
	///
	/// `fixup` is called once per live value with that offset so the caller
	/// can shift the structural indices stored inside its nodes.  Vacant
	/// slots keep their generations (stale handles into them must keep
	/// failing) and both free lists are chained together.  `other`'s lineage
	/// is folded into ours, so handles minted by it, or by arenas it had
	/// previously absorbed, still resolve here.
	pub fn absorb(&mut self, other: Arena<T>, mut fixup: impl FnMut(&mut T, u32)) -> u32 {
		let off = self.slots.len() as u32;
		for (id, o) in other.lineage {
			self.lineage.insert(id, o + off);
		}
		let old_free = self.free_head;
		for mut slot in other.slots {
			match &mut slot.entry {
				Entry::Occupied(value) => fixup(value, off),
				// the absorbed free list's tail picks up our old free list
				Entry::Vacant(next) => *next = match *next {
					Some(n) => Some(n + off),
					None => old_free
				}
			}
			self.slots.push(slot);
		}
		if let Some(f) = other.free_head {
			self.free_head = Some(f + off);
		}
		self.len += other.len;
		off
	}
}

impl<T> Index<u32> for Arena<T> {
	type Output = T;
	fn index(&self, i: u32) -> &T {
		match &self.slots[i as usize].entry {
			Entry::Occupied(value) => value,
			Entry::Vacant(_) => unreachable!("structural index points at a vacant slot")
		}
	}
}

impl<T> IndexMut<u32> for Arena<T> {
	fn index_mut(&mut self, i: u32) -> &mut T {
		match &mut self.slots[i as usize].entry {
			Entry::Occupied(value) => value,
			Entry::Vacant(_) => unreachable!("structural index points at a vacant slot")
		}
	}
}
