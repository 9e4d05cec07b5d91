use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Per-session mutual exclusion for read-modify-write cycles on session documents.
///
/// Clones share the same table, so every handle to one `Booth` serializes against the
/// others. Locking is in-process only.
#[derive(Clone, Debug, Default)]
pub struct SessionLocks {
    table: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    /// Runs `f` while holding the lock for `session_id`. Different sessions do not contend.
    pub fn with_session<T>(&self, session_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(session_id.to_string()).or_default())
        };

        let out = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table and this call hold the entry: nobody is queued behind us.
        if Arc::strong_count(&lock) == 2 {
            table.remove(session_id);
        }
        out
    }

    pub fn tracked_sessions(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn same_session_calls_never_overlap() {
        let locks = SessionLocks::default();
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        locks.with_session("s1", || {
                            if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            std::thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(locks.tracked_sessions(), 0);
    }

    #[test]
    fn returns_closure_value_and_forgets_idle_sessions() {
        let locks = SessionLocks::default();
        assert_eq!(locks.with_session("a", || 7), 7);
        let nested = locks.with_session("a", || locks.with_session("b", || "inner"));
        assert_eq!(nested, "inner");
        assert_eq!(locks.tracked_sessions(), 0);
    }
}
