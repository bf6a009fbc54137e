// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!
A bounded shuffling buffer shared by producer threads and one consumer.
*/

use parking_lot::{Condvar, Mutex};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Returned by [`ShuffleQueue::push`] once the queue is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// Returned by [`ShuffleQueue::pop_many`] when the queue is closed and too few
/// items remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drained {
    pub remaining: usize,
}

struct State<T> {
    items: Vec<T>,
    closed: bool,
    rng: StdRng,
}

/// Producers block while the buffer is full; the consumer blocks until enough
/// items are available or the queue is closed. Items leave in random order.
pub struct ShuffleQueue<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
    min_after_dequeue: usize,
}

impl<T> ShuffleQueue<T> {
    /// `seed` fixes the draw order for a given arrival order.
    pub fn new(capacity: usize, min_after_dequeue: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: Mutex::new(State {
                items: Vec::with_capacity(capacity),
                closed: false,
                rng,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
            min_after_dequeue,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Add an item, blocking while the buffer is full.
    pub fn push(&self, item: T) -> Result<(), Closed> {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }

        if state.closed {
            return Err(Closed);
        }

        state.items.push(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove `n` items at random.
    ///
    /// While open this waits for `n + min_after_dequeue` items. Once closed,
    /// whatever is left is handed out `n` at a time until fewer than `n` remain.
    pub fn pop_many(&self, n: usize) -> Result<Vec<T>, Drained> {
        let mut state = self.state.lock();
        loop {
            let len = state.items.len();
            if len >= n + self.min_after_dequeue || (state.closed && len >= n) {
                break;
            }

            if state.closed {
                return Err(Drained { remaining: len });
            }

            self.not_empty.wait(&mut state);
        }

        let state = &mut *state;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = state.rng.gen_range(0..state.items.len());
            out.push(state.items.swap_remove(idx));
        }

        self.not_full.notify_all();
        Ok(out)
    }

    /// Wake every waiter; later pushes fail. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            self.not_full.notify_all();
            self.not_empty.notify_all();
        }
    }
}
