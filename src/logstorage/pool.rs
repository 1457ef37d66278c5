//! Per-thread object pools for search scratch state
//!
//! Tokenizers, token buffers and bitmaps are taken from a thread-local free
//! list and handed back automatically when the [`Pooled`] guard drops, on
//! every exit path. An object is reset before it re-enters the free list,
//! so the next holder always starts from a clean state while keeping the
//! previously grown capacity.
//!
//! Free lists are never shared between threads, so no locking is needed.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::LocalKey;

use crate::metrics;

/// Default cap on idle objects kept per pool per thread
pub const DEFAULT_MAX_IDLE_PER_THREAD: usize = 64;

static MAX_IDLE_PER_THREAD: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_IDLE_PER_THREAD);

/// Set the cap on idle objects each pool keeps per thread
///
/// Objects released while the free list is full are dropped.
pub fn set_max_idle_per_thread(max_idle: usize) {
    MAX_IDLE_PER_THREAD.store(max_idle, Ordering::Relaxed);
}

/// Current cap on idle objects per pool per thread
pub fn max_idle_per_thread() -> usize {
    MAX_IDLE_PER_THREAD.load(Ordering::Relaxed)
}

/// Scratch object that can be cleared for reuse
pub trait Reusable: Default {
    /// Clear contents while keeping allocated capacity
    fn reset(&mut self);
}

/// Thread-local storage backing a [`LocalPool`]
pub type FreeList<T> = RefCell<Vec<T>>;

/// Handle to a thread-local free list of `T`
pub struct LocalPool<T: 'static> {
    name: &'static str,
    free: &'static LocalKey<FreeList<T>>,
}

impl<T: Reusable + 'static> LocalPool<T> {
    /// Create a pool handle over a `thread_local!` free list
    pub const fn new(name: &'static str, free: &'static LocalKey<FreeList<T>>) -> Self {
        Self { name, free }
    }

    /// Take an object from the current thread's free list, or create one
    pub fn get(&self) -> Pooled<T> {
        let reused = self
            .free
            .try_with(|free| free.borrow_mut().pop())
            .ok()
            .flatten();

        let value = match reused {
            Some(value) => value,
            None => {
                metrics::POOL_MISSES.with_label_values(&[self.name]).inc();
                T::default()
            },
        };

        Pooled {
            value: Some(value),
            free: self.free,
        }
    }

    /// Number of idle objects in the current thread's free list
    pub fn idle(&self) -> usize {
        self.free.try_with(|free| free.borrow().len()).unwrap_or(0)
    }
}

/// Exclusive guard over a pooled object; returns it to the pool on drop
pub struct Pooled<T: Reusable + 'static> {
    value: Option<T>,
    free: &'static LocalKey<FreeList<T>>,
}

impl<T: Reusable + 'static> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // value is only taken in drop
        self.value.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reusable + 'static> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reusable + fmt::Debug + 'static> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.value).finish()
    }
}

impl<T: Reusable + 'static> Drop for Pooled<T> {
    fn drop(&mut self) {
        let Some(mut value) = self.value.take() else {
            return;
        };
        value.reset();

        let max_idle = max_idle_per_thread();
        // Thread teardown: the free list may already be gone, drop the value
        let _ = self.free.try_with(|free| {
            let mut free = free.borrow_mut();
            if free.len() < max_idle {
                free.push(value);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Scratch {
        items: Vec<u32>,
    }

    impl Reusable for Scratch {
        fn reset(&mut self) {
            self.items.clear();
        }
    }

    thread_local! {
        static SCRATCH: FreeList<Scratch> = const { RefCell::new(Vec::new()) };
    }

    static SCRATCH_POOL: LocalPool<Scratch> = LocalPool::new("test_scratch", &SCRATCH);

    #[test]
    fn test_released_object_is_reset_and_reused() {
        let capacity = {
            let mut s = SCRATCH_POOL.get();
            s.items.extend(0..1000);
            s.items.capacity()
        };

        assert_eq!(SCRATCH_POOL.idle(), 1);

        let s = SCRATCH_POOL.get();
        assert!(s.items.is_empty());
        assert_eq!(s.items.capacity(), capacity);
        assert_eq!(SCRATCH_POOL.idle(), 0);
    }

    #[test]
    fn test_free_lists_are_per_thread() {
        drop(SCRATCH_POOL.get());
        let idle_here = SCRATCH_POOL.idle();
        assert!(idle_here >= 1);

        let idle_there = std::thread::spawn(|| SCRATCH_POOL.idle()).join().unwrap();
        assert_eq!(idle_there, 0);
    }

    #[test]
    fn test_release_on_early_return() {
        fn work(fail: bool) -> Result<usize, ()> {
            let mut s = SCRATCH_POOL.get();
            s.items.push(1);
            if fail {
                return Err(());
            }
            Ok(s.items.len())
        }

        let before = SCRATCH_POOL.idle();
        assert!(work(true).is_err());
        assert_eq!(SCRATCH_POOL.idle(), before + 1);
    }
}
