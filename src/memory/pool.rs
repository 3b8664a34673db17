//! Shared pool of codec scratch objects.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use flate2::{Compress, Decompress};

/// Default number of idle objects kept per pool.
pub const DEFAULT_MAX_IDLE: usize = 32;

/// An object that can be returned to a clean state for reuse.
pub trait Scratch {
    /// Discard any state left over from a previous use.
    fn reset(&mut self);
}

impl Scratch for Vec<u8> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl Scratch for Compress {
    fn reset(&mut self) {
        Compress::reset(self);
    }
}

impl Scratch for Decompress {
    fn reset(&mut self) {
        Decompress::reset(self, false);
    }
}

/// A bounded free list of scratch objects, safe to share between threads.
#[derive(Debug)]
pub struct ScratchPool<T> {
    idle: Mutex<Vec<T>>,
    max_idle: usize,
}

impl<T: Scratch> ScratchPool<T> {
    /// Create a pool retaining at most `max_idle` objects.
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Take an idle object, or build one with `make`.
    ///
    /// Reused objects are reset before being handed out. The object goes
    /// back to the pool only if the guard is marked clean.
    pub fn checkout(&self, make: impl FnOnce() -> T) -> Pooled<'_, T> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let item = match reused {
            Some(mut item) => {
                item.reset();
                item
            }
            None => make(),
        };
        Pooled {
            pool: self,
            item: Some(item),
            clean: false,
        }
    }

    /// Number of objects currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, item: T) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(item);
        }
    }
}

impl<T: Scratch> Default for ScratchPool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

/// A checked-out scratch object.
pub struct Pooled<'a, T: Scratch> {
    pool: &'a ScratchPool<T>,
    item: Option<T>,
    clean: bool,
}

impl<T: Scratch> Pooled<'_, T> {
    /// Mark the object as safe to reuse once this guard drops.
    pub fn mark_clean(&mut self) {
        self.clean = true;
    }
}

impl<T: Scratch> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled object is held until drop")
    }
}

impl<T: Scratch> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled object is held until drop")
    }
}

impl<T: Scratch> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            if self.clean {
                self.pool.release(item);
            }
        }
    }
}
