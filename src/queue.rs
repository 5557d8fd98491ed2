//! The ordered result queue: decouples the order traversal workers
//! *finish* in from the order results are *emitted* in.
//!
//! Each top-level path is assigned an index when the driver spawns its
//! walker. Any worker may fill its slot at any time via [`OrderedQueue::add`];
//! a single consumer drains them in ascending index order via
//! [`OrderedQueue::next`], blocking on whichever slot is next due.

use std::sync::{Condvar, Mutex};

struct State<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
}

pub struct OrderedQueue<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
}

impl<T> OrderedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                slots: (0..capacity).map(|_| None).collect(),
                cursor: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Fills `index`'s slot. Each index must be filled exactly once.
    pub fn add(&self, index: usize, value: T) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(
            state.slots[index].is_none(),
            "slot {index} filled more than once"
        );
        state.slots[index] = Some(value);
        self.cond.notify_all();
    }

    /// Blocks until the next not-yet-consumed slot is filled, then returns
    /// it and advances the cursor. Returns `None` once every slot has been
    /// consumed.
    pub fn next(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.cursor >= state.slots.len() {
                return None;
            }
            if state.slots[state.cursor].is_some() {
                let value = state.slots[state.cursor].take();
                state.cursor += 1;
                return value;
            }
            state = self.cond.wait(state).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn yields_in_index_order_regardless_of_fill_order() {
        let queue = Arc::new(OrderedQueue::new(3));

        let q1 = queue.clone();
        let q0 = queue.clone();
        std::thread::scope(|scope| {
            scope.spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                q1.add(1, "b");
            });
            scope.spawn(move || {
                std::thread::sleep(Duration::from_millis(40));
                q0.add(0, "a");
            });
            queue.add(2, "c");

            assert_eq!(queue.next(), Some("a"));
            assert_eq!(queue.next(), Some("b"));
            assert_eq!(queue.next(), Some("c"));
            assert_eq!(queue.next(), None);
        });
    }

    #[test]
    fn empty_queue_yields_none_immediately() {
        let queue: OrderedQueue<()> = OrderedQueue::new(0);
        assert_eq!(queue.next(), None);
    }
}
