use std::{fmt, future::Future, sync::Arc};

use klock_model::{Key, LockOptions};

use crate::{lock::KeyedLock, settle::PendingResult};

/// A callable whose every invocation is serialized under one lock name.
///
/// Built with [`KeyedLock::lock_method`]. Arguments are passed as a single value
/// (use a tuple for several).
pub struct LockedMethod<F> {
    lock: KeyedLock,
    name: Key,
    method: Arc<F>,
    options: LockOptions,
}

impl<F> LockedMethod<F> {
    pub(crate) fn new(lock: KeyedLock, name: Key, method: F, options: LockOptions) -> Self {
        Self {
            lock,
            name,
            method: Arc::new(method),
            options,
        }
    }

    /// Lock name every call is submitted under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the wrapped method with `args` once the lock is free.
    pub fn call<A, Fut, T, E>(&self, args: A) -> PendingResult<T, E>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        A: Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let method = Arc::clone(&self.method);
        self.lock
            .submit(self.name.clone(), move || (method.as_ref())(args), self.options)
    }
}

impl<F> Clone for LockedMethod<F> {
    fn clone(&self) -> Self {
        Self {
            lock: self.lock.clone(),
            name: self.name.clone(),
            method: Arc::clone(&self.method),
            options: self.options,
        }
    }
}

impl<F> fmt::Debug for LockedMethod<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedMethod")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish()
    }
}
