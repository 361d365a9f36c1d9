//! Reusable-object pool.
//!
//! Grows to peak demand and never shrinks. Render-thread only.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances built by the factory.
    pub created: u64,
    /// `allocate` calls served from the free list.
    pub reused: u64,
    /// Instances currently waiting for reuse.
    pub retained: usize,
}

/// Pool of `T`s built on demand by a factory function.
pub struct ObjectPool<T> {
    factory: Box<dyn Fn() -> T + Send>,
    free: Vec<T>,
    stats: PoolStats,
}

impl<T> ObjectPool<T> {
    pub fn new(factory: impl Fn() -> T + Send + 'static) -> Self {
        Self { factory: Box::new(factory), free: Vec::new(), stats: PoolStats::default() }
    }

    /// A recycled instance if one is free, otherwise a fresh one.
    pub fn allocate(&mut self) -> T {
        if let Some(item) = self.free.pop() {
            self.stats.reused = self.stats.reused.saturating_add(1);
            self.stats.retained = self.free.len();
            return item;
        }
        self.stats.created = self.stats.created.saturating_add(1);
        (self.factory)()
    }

    /// Returns `item` for reuse. Callers reset state on the next use.
    pub fn free(&mut self, item: T) {
        self.free.push(item);
        self.stats.retained = self.free.len();
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool").field("stats", &self.stats).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_items_are_reused_before_creating() {
        let mut pool = ObjectPool::new(Vec::<u8>::new);
        let a = pool.allocate();
        let b = pool.allocate();
        pool.free(a);
        pool.free(b);

        let _c = pool.allocate();
        let _d = pool.allocate();
        let _e = pool.allocate();

        let st = pool.stats();
        assert_eq!(st.created, 3);
        assert_eq!(st.reused, 2);
        assert_eq!(st.retained, 0);
    }

    #[test]
    fn pool_keeps_instance_state() {
        let mut pool = ObjectPool::new(|| Vec::<u8>::with_capacity(16));
        let mut v = pool.allocate();
        v.push(1);
        pool.free(v);
        let v = pool.allocate();
        assert_eq!(v, vec![1]);
        assert!(v.capacity() >= 16);
    }
}
