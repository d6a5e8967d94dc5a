#[repr(transparent)]
pub(crate) struct HookLock<T: Send + Sync>(spin::RwLock<Option<T>>);

impl<T: Send + Sync> HookLock<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(spin::RwLock::new(None))
    }

    /// Clones the stored value out, so the lock is not held while it is used.
    #[inline]
    pub(crate) fn cloned(&self) -> Option<T>
    where
        T: Clone,
    {
        self.0.read().clone()
    }

    #[inline]
    pub(crate) fn replace(&self, value: Option<T>) -> Option<T> {
        core::mem::replace(&mut *self.0.write(), value)
    }
}

impl<T: Send + Sync> Default for HookLock<T> {
    fn default() -> Self {
        Self::new()
    }
}
