//! Scratch buffers for staging constructor arguments.
//!
//! Up to eight arguments live inline. Bigger buffers come from a
//! per-thread pool split by size class and go back to it on drop, so a
//! failing resolution returns its buffer like a successful one does.

use std::cell::RefCell;
use std::ops::Deref;

use smallvec::SmallVec;

use crate::instance::Instance;

pub const INLINE_ARGS: usize = 8;

type Slots = SmallVec<[Option<Instance>; INLINE_ARGS]>;

/// (slot capacity, buffers kept per thread)
const SIZE_CLASSES: [(usize, usize); 3] = [(8, 4), (16, 2), (32, 1)];

thread_local! {
    static POOL: RefCell<[Vec<Slots>; 3]> = RefCell::new([Vec::new(), Vec::new(), Vec::new()]);
}

fn size_class(capacity: usize) -> Option<usize> {
    SIZE_CLASSES.iter().position(|&(max, _)| capacity <= max)
}

/// Argument buffer returned to its pool when dropped.
#[derive(Debug)]
pub struct ArgBuffer {
    slots: Slots,
    class: Option<usize>,
}

impl ArgBuffer {
    /// Acquires a buffer able to hold `capacity` arguments without
    /// reallocating. Falls back to a one-off allocation when the pool
    /// for that size class is exhausted, or above 32 slots.
    pub fn acquire(capacity: usize) -> Self {
        let class = size_class(capacity);

        let pooled = class.and_then(|c| {
            POOL.try_with(|pool| pool.borrow_mut()[c].pop())
                .ok()
                .flatten()
        });

        let slots = pooled.unwrap_or_else(|| {
            let size = class.map_or(capacity, |c| SIZE_CLASSES[c].0);
            SmallVec::with_capacity(size)
        });

        Self { slots, class }
    }

    #[inline]
    pub fn push(&mut self, value: Option<Instance>) {
        self.slots.push(value);
    }

    #[inline]
    pub fn as_slice(&self) -> &[Option<Instance>] {
        &self.slots
    }
}

impl Deref for ArgBuffer {
    type Target = [Option<Instance>];

    fn deref(&self) -> &Self::Target {
        &self.slots
    }
}

impl Drop for ArgBuffer {
    fn drop(&mut self) {
        self.slots.clear();

        let Some(class) = self.class else {
            return;
        };
        let slots = std::mem::take(&mut self.slots);
        let _ = POOL.try_with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool[class].len() < SIZE_CLASSES[class].1 {
                pool[class].push(slots);
            }
        });
    }
}

#[cfg(test)]
pub(crate) fn pooled_buffers(capacity: usize) -> usize {
    size_class(capacity).map_or(0, |c| POOL.with(|pool| pool.borrow()[c].len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffers_stay_inline() {
        let buf = ArgBuffer::acquire(3);
        assert!(!buf.slots.spilled());
    }

    #[test]
    fn buffer_returns_to_pool_cleared() {
        let before = pooled_buffers(12);
        {
            let mut buf = ArgBuffer::acquire(12);
            for i in 0..12 {
                buf.push(Some(Instance::new(i)));
            }
            assert_eq!(buf.len(), 12);
        }
        assert_eq!(pooled_buffers(12), (before + 1).min(2));

        let reused = ArgBuffer::acquire(10);
        assert!(reused.is_empty());
        assert!(reused.slots.capacity() >= 16);
    }

    #[test]
    fn pool_is_bounded_per_class() {
        let held: Vec<ArgBuffer> = (0..5).map(|_| ArgBuffer::acquire(30)).collect();
        drop(held);
        assert_eq!(pooled_buffers(30), 1);
    }

    #[test]
    fn oversized_buffers_are_not_pooled() {
        let mut buf = ArgBuffer::acquire(40);
        buf.push(None);
        assert_eq!(buf.as_slice().len(), 1);
        drop(buf);
        assert_eq!(pooled_buffers(40), 0);
    }

    #[test]
    fn drop_releases_values() {
        let value = Instance::new(String::from("held"));
        {
            let mut buf = ArgBuffer::acquire(1);
            buf.push(Some(value.clone()));
        }
        let probe = value.downcast::<String>().unwrap();
        // `value` + `probe` only: the buffer let go of its clone.
        assert_eq!(std::sync::Arc::strong_count(&probe), 2);
    }
}
