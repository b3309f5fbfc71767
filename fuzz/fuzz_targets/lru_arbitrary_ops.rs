#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use lrukit::policy::lru::LruCache;
use lrukit::traits::{CoreCache, LruCacheTrait, MutableCache};

// Fuzz arbitrary operation sequences on LruCache
//
// Tests random sequences of insert, get, peek, remove, touch, pop_lru,
// recency_rank, clear operations, validating the capacity bound and
// index/ordering agreement after every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks a small capacity in 1..=16
    let capacity = usize::from(data[0] % 16) + 1;
    let mut cache: LruCache<u8, u32> = match LruCache::new(capacity) {
        Ok(cache) => cache,
        Err(_) => return,
    };

    let mut idx = 1;
    while idx + 1 < data.len() {
        let op = data[idx] % 8;
        let key = data[idx + 1] % 32;

        match op {
            0 | 1 => {
                // insert
                let old_contains = cache.contains(&key);
                let previous = cache.insert(key, Arc::new(u32::from(key) * 3));

                assert_eq!(previous.is_some(), old_contains);
                assert!(cache.contains(&key));
            }
            2 => {
                // get
                let old_len = cache.len();
                let hit = cache.get(&key);

                assert_eq!(hit.is_some(), cache.contains(&key));
                assert_eq!(cache.len(), old_len);
                if hit.is_some() {
                    assert_eq!(cache.recency_rank(&key), Some(0));
                }
            }
            3 => {
                // peek leaves the order alone
                let before: Vec<u8> = cache.iter().map(|(k, _)| k).collect();
                let _ = cache.peek(&key);
                let after: Vec<u8> = cache.iter().map(|(k, _)| k).collect();
                assert_eq!(before, after);
            }
            4 => {
                // remove
                let old_len = cache.len();
                let removed = cache.remove(&key);

                if removed.is_some() {
                    assert_eq!(cache.len(), old_len - 1);
                }
                assert!(!cache.contains(&key));
            }
            5 => {
                // touch
                let touched = cache.touch(&key);
                if touched {
                    assert_eq!(cache.recency_rank(&key), Some(0));
                }
            }
            6 => {
                // pop_lru
                let old_len = cache.len();
                if let Some((popped, _)) = cache.pop_lru() {
                    assert_eq!(cache.len(), old_len - 1);
                    assert!(!cache.contains(&popped));
                } else {
                    assert_eq!(old_len, 0);
                }
            }
            _ => {
                cache.clear();
                assert!(cache.is_empty());
            }
        }

        assert!(cache.len() <= capacity);
        cache.check_invariants().unwrap();

        idx += 2;
    }
});
