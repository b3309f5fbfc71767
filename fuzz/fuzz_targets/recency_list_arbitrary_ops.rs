#![no_main]

use libfuzzer_sys::fuzz_target;
use lrukit::ds::RecencyList;

// Fuzz arbitrary operation sequences on RecencyList
//
// Tests random sequences of push_front, pop_back, pop_front, move_to_front,
// remove, get, clear operations against the sentinel-bounded list.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut list: RecencyList<u32> = RecencyList::new();
    let mut all_handles = Vec::new();

    let mut idx = 0;
    while idx + 1 < data.len() {
        let op = data[idx] % 7;
        let value = u32::from(data[idx + 1]);

        match op {
            0 | 1 => {
                // push_front
                let handle = list.push_front(value);
                all_handles.push(handle);

                assert_eq!(list.front(), Some(&value));
                assert!(list.contains(handle));
                assert_eq!(list.get(handle), Some(&value));
            }
            2 => {
                // pop_back
                let old_len = list.len();
                let popped = list.pop_back();

                if popped.is_some() {
                    assert_eq!(list.len(), old_len - 1);
                } else {
                    assert_eq!(list.len(), 0);
                }
            }
            3 => {
                // pop_front
                let old_len = list.len();
                let popped = list.pop_front();

                if popped.is_some() {
                    assert_eq!(list.len(), old_len - 1);
                } else {
                    assert_eq!(list.len(), 0);
                }
            }
            4 => {
                // move_to_front
                if !all_handles.is_empty() {
                    let handle = all_handles[(value as usize) % all_handles.len()];

                    let was_moved = list.move_to_front(handle);
                    if was_moved {
                        assert_eq!(list.front_handle(), Some(handle));
                    }
                }
            }
            5 => {
                // remove
                if !all_handles.is_empty() {
                    let handle = all_handles[(value as usize) % all_handles.len()];

                    let old_len = list.len();
                    let removed = list.remove(handle);
                    if removed.is_some() {
                        assert_eq!(list.len(), old_len - 1);
                        assert!(!list.contains(handle));
                    }
                }
            }
            _ => {
                list.clear();
                all_handles.clear();
                assert!(list.is_empty());
            }
        }

        list.debug_validate_invariants();

        idx += 2;
    }
});
