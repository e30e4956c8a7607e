use crate::core::Value;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::{debug, info};

#[derive(Debug)]
struct Ring {
    slots: Box<[Value]>,
    head: usize,
    tail: usize,
    len: usize,
}

/// Fixed-capacity FIFO ring.
///
/// `push` and `pop` never block and never overwrite: they report whether they
/// did anything and leave the retry policy to the caller. Every operation runs
/// under one lock, so the buffer can be shared across threads.
#[derive(Debug)]
pub struct BoundedBuffer {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl BoundedBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            ring: Mutex::new(Ring {
                slots: vec![0; capacity].into_boxed_slice(),
                head: 0,
                tail: 0,
                len: 0,
            }),
            capacity,
        }
    }

    /// Enqueues `value`, or returns `false` without touching the buffer when
    /// it is already full.
    pub fn push(&self, value: Value) -> bool {
        let mut ring = self.ring.lock();
        if ring.len == self.capacity {
            info!(value, capacity = self.capacity, "buffer overflow");
            return false;
        }

        let tail = ring.tail;
        ring.slots[tail] = value;
        ring.tail = (tail + 1) % self.capacity;
        ring.len += 1;
        debug!(value, len = ring.len, capacity = self.capacity, "buffer push");
        true
    }

    /// Dequeues the oldest value, or `None` when empty.
    pub fn pop(&self) -> Option<Value> {
        let mut ring = self.ring.lock();
        if ring.len == 0 {
            return None;
        }

        let head = ring.head;
        let value = ring.slots[head];
        ring.head = (head + 1) % self.capacity;
        ring.len -= 1;
        debug!(value, len = ring.len, capacity = self.capacity, "buffer pop");
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }
}
