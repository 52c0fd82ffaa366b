//! Concurrency tests for ProtectedWordCache.
//!
//! Readers on plain threads race a writer that alternates between two
//! disjoint sets. Every snapshot must be one of the two sets in full, and
//! generations seen by any one reader never go backwards.

use protected_words::{ProtectedWordCache, ProtectedWordLookup};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const SET_SIZE: usize = 200;
const REPLACEMENTS: usize = 500;
const READERS: usize = 4;

fn prefixed(prefix: &str) -> HashSet<String> {
    (0..SET_SIZE).map(|i| format!("{}{}", prefix, i)).collect()
}

#[test]
fn test_snapshots_are_never_partial() {
    let cache = Arc::new(ProtectedWordCache::new());
    let odd = Arc::new(prefixed("a"));
    let even = Arc::new(prefixed("b"));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let cache = cache.clone();
            let odd = odd.clone();
            let even = even.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last_generation = 0;
                let mut reads = 0usize;
                while !done.load(Ordering::Acquire) || reads == 0 {
                    let snapshot = cache.snapshot();
                    let generation = snapshot.generation();
                    assert!(generation >= last_generation, "generation went backwards");
                    last_generation = generation;

                    if generation == 0 {
                        assert!(snapshot.is_empty());
                    } else if generation % 2 == 1 {
                        assert_eq!(snapshot.as_set(), odd.as_ref());
                    } else {
                        assert_eq!(snapshot.as_set(), even.as_ref());
                    }
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    for i in 0..REPLACEMENTS {
        let next = if i % 2 == 0 { odd.as_ref() } else { even.as_ref() };
        cache.replace(next.clone());
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(cache.generation(), REPLACEMENTS as u64);
}

#[test]
fn test_lookup_from_many_threads() {
    let cache = Arc::new(ProtectedWordCache::new());
    cache.replace(prefixed("w"));
    let lookup: Arc<dyn ProtectedWordLookup> = cache.clone();

    let handles: Vec<_> = (0..READERS)
        .map(|t| {
            let lookup = lookup.clone();
            thread::spawn(move || {
                (0..SET_SIZE)
                    .filter(|i| lookup.is_protected(&format!("w{}", (i + t) % SET_SIZE)))
                    .count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), SET_SIZE);
    }
}

#[test]
fn test_concurrent_writers_do_not_corrupt_state() {
    let cache = Arc::new(ProtectedWordCache::new());

    let writers: Vec<_> = (0..READERS)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    cache.replace(prefixed(&format!("t{}-", t)));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.len(), SET_SIZE);
    assert_eq!(snapshot.generation(), (READERS * 50) as u64);

    // Last writer wins: the set belongs to exactly one writer
    let first = snapshot.iter().next().unwrap();
    let prefix = &first[..first.find('-').unwrap() + 1];
    assert!(snapshot.iter().all(|w| w.starts_with(prefix)));
}
