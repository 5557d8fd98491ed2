//! The concurrency gate: a process-wide counting semaphore bounding how
//! many blocking operations (stat, open, read, readdir, in-memory hashing)
//! run at once.
//!
//! Callers must hold at most one [`Permit`] at a time, and must not hold
//! one while waiting on other threads. [`Permit::release`] returns a
//! [`Released`] token that can only be turned back into a `Permit` by
//! reacquiring — the type makes "give it up before you wait" a borrow you
//! can't skip by accident, though it can't stop a caller from never
//! reacquiring at all.

use std::sync::{Condvar, Mutex};

pub struct Gate {
    permits: Mutex<usize>,
    cond: Condvar,
}

impl Gate {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits.max(1)),
            cond: Condvar::new(),
        }
    }

    /// A gate sized to the number of available CPUs, falling back to 1.
    pub fn sized_to_cpus() -> Self {
        let n = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(1);
        Self::new(n)
    }

    pub fn acquire(&self) -> Permit<'_> {
        let mut permits = self.permits.lock().unwrap();
        while *permits == 0 {
            permits = self.cond.wait(permits).unwrap();
        }
        *permits -= 1;
        Permit {
            gate: self,
            held: true,
        }
    }

    fn release_one(&self) {
        let mut permits = self.permits.lock().unwrap();
        *permits += 1;
        self.cond.notify_one();
    }
}

/// An acquired permit. Must be released before the holder blocks on
/// anything other than another gate-governed operation.
pub struct Permit<'a> {
    gate: &'a Gate,
    held: bool,
}

impl<'a> Permit<'a> {
    pub fn release(mut self) -> Released<'a> {
        self.held = false;
        self.gate.release_one();
        Released { gate: self.gate }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.held {
            self.gate.release_one();
        }
    }
}

/// Proof that a permit was given up. The only way back to a `Permit` is
/// to reacquire one, which may block.
pub struct Released<'a> {
    gate: &'a Gate,
}

impl<'a> Released<'a> {
    pub fn reacquire(self) -> Permit<'a> {
        self.gate.acquire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn bounds_concurrency_to_permit_count() {
        let gate = Arc::new(Gate::new(2));
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let gate = gate.clone();
                let concurrent = concurrent.clone();
                let max_seen = max_seen.clone();
                scope.spawn(move || {
                    let _permit = gate.acquire();
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn release_then_reacquire_round_trips() {
        let gate = Gate::new(1);
        let permit = gate.acquire();
        let released = permit.release();
        let _permit2 = released.reacquire();
    }
}
