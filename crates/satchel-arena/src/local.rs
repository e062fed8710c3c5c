//! Per-thread arena registry.
//!
//! Each thread owns at most one arena per element type, created lazily the
//! first time a bag of that type is constructed on the thread. The registry
//! holds one [`SharedStorage`] handle per type; bags hold the others. When
//! the thread exits the registry's handles are dropped, and each arena is
//! freed together with its last bag.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::StorageConfig;
use crate::error::ArenaError;
use crate::storage::SharedStorage;

thread_local! {
    /// `TypeId::of::<T>()` → `SharedStorage<T>` for this thread.
    static ARENAS: RefCell<IndexMap<TypeId, Box<dyn Any>>> = RefCell::new(IndexMap::new());
}

fn lookup<T: 'static>(arenas: &IndexMap<TypeId, Box<dyn Any>>) -> Option<SharedStorage<T>> {
    arenas.get(&TypeId::of::<T>()).map(|entry| {
        entry
            .downcast_ref::<SharedStorage<T>>()
            .expect("registry entries are keyed by their own TypeId")
            .clone()
    })
}

/// The calling thread's arena for `T`, creating it with the default config
/// on first use.
///
/// During thread-local teardown the registry is gone; a fresh detached
/// arena is returned instead.
pub(crate) fn current<T: 'static>() -> SharedStorage<T> {
    ARENAS
        .try_with(|arenas| {
            if let Some(storage) = lookup::<T>(&arenas.borrow()) {
                return storage;
            }
            debug!(element = type_name::<T>(), "creating thread arena");
            let storage = SharedStorage::<T>::new();
            arenas
                .borrow_mut()
                .insert(TypeId::of::<T>(), Box::new(storage.clone()));
            storage
        })
        .unwrap_or_else(|_| {
            trace!(
                element = type_name::<T>(),
                "thread arena registry destroyed, using a detached arena"
            );
            SharedStorage::new()
        })
}

/// Create the calling thread's arena for `T` with a custom config.
///
/// Must run before the first bag of `T` is constructed on this thread.
///
/// # Errors
///
/// [`ArenaError::AlreadyInitialised`] if the arena already exists.
///
/// # Panics
///
/// Panics if called while the thread's locals are being destroyed.
pub fn configure_current_thread<T: 'static>(
    config: &StorageConfig,
) -> Result<SharedStorage<T>, ArenaError> {
    ARENAS.with(|arenas| {
        let mut arenas = arenas.borrow_mut();
        if arenas.contains_key(&TypeId::of::<T>()) {
            return Err(ArenaError::AlreadyInitialised {
                element: type_name::<T>(),
            });
        }
        debug!(
            element = type_name::<T>(),
            value_capacity = config.initial_value_capacity,
            slot_capacity = config.initial_slot_capacity,
            "configuring thread arena"
        );
        let storage = SharedStorage::<T>::with_config(config);
        arenas.insert(TypeId::of::<T>(), Box::new(storage.clone()));
        Ok(storage)
    })
}

/// Whether the calling thread already has an arena for `T`.
pub fn is_initialised<T: 'static>() -> bool {
    ARENAS
        .try_with(|arenas| arenas.borrow().contains_key(&TypeId::of::<T>()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every #[test] runs on its own thread, so each starts with an empty registry.

    #[test]
    fn arena_is_created_lazily_and_reused() {
        assert!(!is_initialised::<u16>());
        let a = current::<u16>();
        assert!(is_initialised::<u16>());
        let b = current::<u16>();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn element_types_get_separate_arenas() {
        let _a = current::<u8>();
        assert!(is_initialised::<u8>());
        assert!(!is_initialised::<i8>());
    }

    #[test]
    fn configure_before_first_use() {
        let configured =
            configure_current_thread::<u64>(&StorageConfig::new().with_value_capacity(4096))
                .unwrap();
        assert!(configured.stats().value_capacity >= 4096);
        assert!(configured.ptr_eq(&current::<u64>()));
    }

    #[test]
    fn configure_after_first_use_fails() {
        let _ = current::<i32>();
        let err = configure_current_thread::<i32>(&StorageConfig::default()).unwrap_err();
        assert_eq!(err, ArenaError::AlreadyInitialised { element: "i32" });
    }

    #[test]
    fn threads_get_disjoint_arenas() {
        let here = current::<u32>();
        let there = std::thread::spawn(current::<u32>).join().unwrap();
        assert!(!here.ptr_eq(&there));
    }
}
