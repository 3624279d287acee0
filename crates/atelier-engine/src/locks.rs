//! Per-key serialization of check-then-insert sequences.
//!
//! Two requests booking the same (item, date, shift) must not both pass the
//! capacity check before either inserts. The service takes the key's lock
//! around the check and the write; unrelated keys proceed in parallel.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::{BookingError, Result};

/// A table of independent mutexes, created on first use.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with<T>(&self, key: &K, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| poisoned())?;
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let _guard = slot.lock().map_err(|_| poisoned())?;
        f()
    }

    /// Run `f` while holding the locks for both keys.
    ///
    /// Locks are taken in key order, so callers pairing the same keys in
    /// opposite order cannot deadlock. Equal keys are locked once.
    pub fn with_pair<T>(&self, a: &K, b: &K, f: impl FnOnce() -> Result<T>) -> Result<T>
    where
        K: Ord,
    {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        if first == second {
            return self.with(first, f);
        }
        self.with(first, || self.with(second, f))
    }
}

fn poisoned() -> BookingError {
    BookingError::Store("booking lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn same_key_runs_one_at_a_time() {
        let locks = Arc::new(KeyedLocks::<u64>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks
                        .with(&7, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pairs_in_opposite_order_do_not_deadlock() {
        let locks = Arc::new(KeyedLocks::<u64>::new());
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || {
                    let (a, b) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
                    for _ in 0..50 {
                        locks.with_pair(&a, &b, || Ok(())).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn pair_of_equal_keys_locks_once() {
        let locks = KeyedLocks::<u64>::new();
        assert_eq!(locks.with_pair(&3, &3, || Ok(5)).unwrap(), 5);
    }
}
