//! # Scratch Pool
//!
//! Meshing and flood filling need large working buffers. Allocating them per
//! chunk would churn the allocator on every job, so each worker keeps a small
//! pool and hands buffers out for the duration of one task.
//!
//! Buffers are sized by the grid they were last used for. When a buffer is
//! handed to a job of a different shape (a chunk at another level of detail)
//! it is reshaped first, which clears everything size dependent.

/// A scratch object that can be recycled between jobs.
pub trait Poolable {
    /// The parameters the object's buffers are sized for.
    type Shape: Copy + PartialEq + std::fmt::Debug;

    /// Builds a fresh object sized for `shape`.
    fn create(shape: Self::Shape) -> Self;

    /// The shape the object is currently sized for.
    fn shape(&self) -> Self::Shape;

    /// Resizes and clears the object so it fits `shape`.
    fn reshape(&mut self, shape: Self::Shape);
}

/// A pool of recyclable scratch objects.
///
/// `acquire` prefers an idle object that already has the requested shape,
/// then any idle object (reshaped), then a new one.
#[derive(Debug)]
pub struct Pool<T: Poolable> {
    idle: Vec<T>,
    created: usize,
    reshaped: usize,
}

impl<T: Poolable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> Pool<T> {
    /// Creates an empty pool. Objects are built lazily.
    pub fn new() -> Self {
        Pool {
            idle: Vec::new(),
            created: 0,
            reshaped: 0,
        }
    }

    /// Takes an object sized for `shape` out of the pool.
    pub fn acquire(&mut self, shape: T::Shape) -> T {
        if let Some(position) = self.idle.iter().position(|item| item.shape() == shape) {
            return self.idle.swap_remove(position);
        }

        match self.idle.pop() {
            Some(mut item) => {
                log::trace!("Reshaping pooled scratch {:?} -> {:?}", item.shape(), shape);
                item.reshape(shape);
                self.reshaped += 1;
                item
            }
            None => {
                self.created += 1;
                T::create(shape)
            }
        }
    }

    /// Returns an object to the pool.
    pub fn release(&mut self, item: T) {
        self.idle.push(item);
    }

    /// Runs `job` with a pooled object and returns it afterwards.
    pub fn with<R>(&mut self, shape: T::Shape, job: impl FnOnce(&mut T) -> R) -> R {
        let mut item = self.acquire(shape);
        let result = job(&mut item);
        self.release(item);
        result
    }

    /// Number of objects currently idle.
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Number of objects this pool has ever built.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Number of times an idle object had to be reshaped.
    pub fn reshaped_count(&self) -> usize {
        self.reshaped
    }
}
