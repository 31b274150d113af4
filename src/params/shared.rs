use std::sync::Arc;

use parking_lot::RwLock;

/// Settings shared between an editor thread and the render path.
///
/// The render path only ever reads through [`SharedSettings::snapshot`], so a
/// frame never observes a half-applied edit.
#[derive(Debug, Default)]
pub struct SharedSettings<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for SharedSettings<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> SharedSettings<T> {
    pub fn new(settings: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> T {
        self.inner.read().clone()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut *guard)
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        f(&*guard)
    }

    pub fn replace(&self, settings: T) -> T {
        std::mem::replace(&mut *self.inner.write(), settings)
    }
}
