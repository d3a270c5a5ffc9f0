//! One property suite, four heaps: everything here is written against the
//! `MeldableHeap` trait and stamped out per variant, so a behavioral
//! difference between the implementations shows up as a failure in exactly
//! one module below.

use rand::prelude::*;

use meldheap::bheap::BinomHeap;
use meldheap::binheap::BinHeap;
use meldheap::fheap::FibHeap;
use meldheap::lheap::LeftistHeap;
use meldheap::{HeapError, MeldableHeap};

fn heap_sort_matches_std<H: MeldableHeap<i32>>() {
    let mut rng = StdRng::seed_from_u64(0x1dea);
    let mut keys: Vec<i32> = (0..200).collect();
    keys.shuffle(&mut rng);
    let mut heap = H::new();
    for &k in &keys {
        heap.insert(k);
    }
    assert_eq!(heap.len(), keys.len());
    let mut drained = Vec::new();
    while let Ok(k) = heap.extract_min() {
        drained.push(k);
    }
    keys.sort();
    assert_eq!(drained, keys);
    assert!(heap.is_empty());
}

fn merge_equals_interleaved_inserts<H: MeldableHeap<i32>>() {
    let mut rng = StdRng::seed_from_u64(0x3e1d);
    let mut keys: Vec<i32> = (0..120).collect();
    keys.shuffle(&mut rng);
    let (left, right) = keys.split_at(70);

    let mut merged = H::new();
    for &k in left {
        merged.insert(k);
    }
    let mut other = H::new();
    for &k in right {
        other.insert(k);
    }
    merged.merge(other);
    merged.merge(H::new());

    let mut plain = H::new();
    for &k in &keys {
        plain.insert(k);
    }

    assert_eq!(merged.len(), plain.len());
    while let Ok(k) = plain.extract_min() {
        assert_eq!(merged.extract_min(), Ok(k));
    }
    assert!(merged.is_empty());
}

fn handles_survive_merge<H: MeldableHeap<i32>>() {
    let mut a = H::new();
    for k in [10, 20, 30] {
        a.insert(k);
    }
    let mut b = H::new();
    let h = b.insert(25);
    b.insert(15);
    a.merge(b);
    assert_eq!(a.decrease_key(&h, 1), Ok(()));
    assert_eq!(a.extract_min(), Ok(1));
    assert_eq!(a.extract_min(), Ok(10));
}

fn failed_decrease_changes_nothing<H: MeldableHeap<i32>>() {
    let mut heap = H::new();
    let h = heap.insert(10);
    heap.insert(20);
    assert_eq!(heap.decrease_key(&h, 11), Err(HeapError::InvalidDecrease));
    // equal to the current key is a valid no-op
    assert_eq!(heap.decrease_key(&h, 10), Ok(()));
    assert_eq!(heap.extract_min(), Ok(10));
    assert_eq!(heap.extract_min(), Ok(20));
    assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap));
}

fn empty_heap_errors<H: MeldableHeap<i32>>() {
    let mut heap = H::new();
    assert!(heap.is_empty());
    assert!(matches!(heap.minimum(), Err(HeapError::EmptyHeap)));
    assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap));
    assert!(matches!(heap.find(&1), Err(HeapError::NotFound)));
    assert_eq!(heap.dump(), "");
}

fn rejects_foreign_and_stale_handles<H: MeldableHeap<i32>>() {
    let mut a = H::new();
    a.insert(3);
    let mut b = H::new();
    let foreign = b.insert(3);
    assert_eq!(a.decrease_key(&foreign, 1), Err(HeapError::NotFound));
    assert_eq!(a.delete(&foreign), Err(HeapError::NotFound));
    // extracting the minimum invalidates the handle that referred to it
    let hmin = a.insert(0);
    assert_eq!(a.extract_min(), Ok(0));
    assert_eq!(a.delete(&hmin), Err(HeapError::NotFound));
    assert_eq!(a.len(), 1);
}

fn find_then_delete_removes_that_key<H: MeldableHeap<i32>>() {
    let mut heap = H::new();
    for k in [7, 2, 9, 4, 2] {
        heap.insert(k);
    }
    let h = heap.find(&4).unwrap();
    assert_eq!(heap.delete(&h), Ok(()));
    let mut drained = Vec::new();
    while let Ok(k) = heap.extract_min() {
        drained.push(k);
    }
    assert_eq!(drained, [2, 2, 7, 9]);
}

fn dump_mentions_every_key<H: MeldableHeap<i32>>() {
    let mut heap = H::new();
    for k in [31, 17, 23] {
        heap.insert(k);
    }
    let dump = heap.dump();
    for needle in ["17", "23", "31"] {
        assert!(dump.contains(needle), "dump lost {}: {:?}", needle, dump);
    }
    assert!(dump.ends_with('\n'));
}

/// Random op soup against a flat vector model.  Keys are kept distinct
/// (fresh inserts count up, decreased keys count down from -1) so the model
/// never has to guess which duplicate an operation hit.
fn randomized_ops_match_a_sorted_model<H: MeldableHeap<i32>>() {
    let mut rng = StdRng::seed_from_u64(0xc0ffee);
    let mut heap = H::new();
    let mut model: Vec<i32> = Vec::new();
    let mut next_key = 0;
    let mut next_low = -1;
    for _ in 0..600 {
        match rng.gen_range(0..100) {
            0..=44 => {
                heap.insert(next_key);
                model.push(next_key);
                next_key += 1;
            },
            45..=64 => match model.iter().min().copied() {
                Some(min) => {
                    assert_eq!(heap.extract_min(), Ok(min));
                    model.retain(|&k| k != min);
                },
                None => assert_eq!(heap.extract_min(), Err(HeapError::EmptyHeap))
            },
            65..=79 => {
                if model.is_empty() {
                    continue
                }
                let k = model[rng.gen_range(0..model.len())];
                let h = heap.find(&k).unwrap();
                assert_eq!(heap.decrease_key(&h, next_low), Ok(()));
                let i = model.iter().position(|&x| x == k).unwrap();
                model[i] = next_low;
                next_low -= 1;
            },
            80..=89 => {
                if model.is_empty() {
                    continue
                }
                let k = model[rng.gen_range(0..model.len())];
                let h = heap.find(&k).unwrap();
                assert_eq!(heap.delete(&h), Ok(()));
                let i = model.iter().position(|&x| x == k).unwrap();
                model.swap_remove(i);
            },
            _ => {
                let mut side = H::new();
                for _ in 0..rng.gen_range(0..8) {
                    side.insert(next_key);
                    model.push(next_key);
                    next_key += 1;
                }
                heap.merge(side);
            }
        }
        assert_eq!(heap.len(), model.len());
    }
    model.sort();
    let mut drained = Vec::new();
    while let Ok(k) = heap.extract_min() {
        drained.push(k);
    }
    assert_eq!(drained, model);
}

macro_rules! variant_suite {
    ($name:ident, $heap:ty) => {
        mod $name {
            use super::*;

            #[test]
            fn heap_sort_matches_std() {
                super::heap_sort_matches_std::<$heap>();
            }

            #[test]
            fn merge_equals_interleaved_inserts() {
                super::merge_equals_interleaved_inserts::<$heap>();
            }

            #[test]
            fn handles_survive_merge() {
                super::handles_survive_merge::<$heap>();
            }

            #[test]
            fn failed_decrease_changes_nothing() {
                super::failed_decrease_changes_nothing::<$heap>();
            }

            #[test]
            fn empty_heap_errors() {
                super::empty_heap_errors::<$heap>();
            }

            #[test]
            fn rejects_foreign_and_stale_handles() {
                super::rejects_foreign_and_stale_handles::<$heap>();
            }

            #[test]
            fn find_then_delete_removes_that_key() {
                super::find_then_delete_removes_that_key::<$heap>();
            }

            #[test]
            fn dump_mentions_every_key() {
                super::dump_mentions_every_key::<$heap>();
            }

            #[test]
            fn randomized_ops_match_a_sorted_model() {
                super::randomized_ops_match_a_sorted_model::<$heap>();
            }
        }
    }
}

variant_suite!(binary, BinHeap<i32>);
variant_suite!(binomial, BinomHeap<i32>);
variant_suite!(leftist, LeftistHeap<i32>);
variant_suite!(fibonacci, FibHeap<i32>);
