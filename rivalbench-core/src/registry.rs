//! Run Registry
//!
//! Config-scoped store of lazily created session values. Each competition
//! configuration owns one registry (shared as `Arc<RunRegistry>`); values are
//! created on first access and live as long as the registry.
//!
//! Creation is atomic: concurrent callers asking for the same key all receive
//! the same `Arc`, and the initialiser runs at most once.

use fxhash::FxHashMap;
use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors from registry access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Slot was created with a different value type
    #[error("Registry slot '{key}' holds a value of another type than {expected}")]
    TypeMismatch {
        /// Slot name
        key: &'static str,
        /// Type requested by the caller
        expected: &'static str,
    },
}

/// Typed name of a registry slot
pub struct StateKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StateKey<T> {
    /// Key with the given slot name
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Slot name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StateKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateKey<T> {}

impl<T> std::fmt::Debug for StateKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateKey").field(&self.name).finish()
    }
}

type Slot = Arc<dyn Any + Send + Sync>;

/// Store of session values keyed by [`StateKey`]
#[derive(Default)]
pub struct RunRegistry {
    slots: Mutex<FxHashMap<&'static str, Slot>>,
}

impl RunRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, created with `init` if the slot is empty
    pub fn get_or_create<T, F>(&self, key: &StateKey<T>, init: F) -> Result<Arc<T>, RegistryError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .entry(key.name)
                .or_insert_with(|| Arc::new(init()) as Slot)
                .clone()
        };
        Self::downcast(key, slot)
    }

    /// Value for `key` if it exists
    pub fn get<T>(&self, key: &StateKey<T>) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: Any + Send + Sync,
    {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(key.name).cloned()
        };
        slot.map(|s| Self::downcast(key, s)).transpose()
    }

    /// Drop the value for `key`. Returns whether a value was present.
    pub fn remove<T>(&self, key: &StateKey<T>) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key.name).is_some()
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no slot is populated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every value
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn downcast<T>(key: &StateKey<T>, slot: Slot) -> Result<Arc<T>, RegistryError>
    where
        T: Any + Send + Sync,
    {
        slot.downcast::<T>().map_err(|_| RegistryError::TypeMismatch {
            key: key.name,
            expected: type_name::<T>(),
        })
    }
}

impl std::fmt::Debug for RunRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = slots.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("RunRegistry").field("slots", &names).finish()
    }
}
