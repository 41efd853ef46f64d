// src/relation/provide.rs

use std::any::{Any, TypeId};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Type-erased face of a [`Provide`], used by the graph builder to match
/// views against provides.
pub trait AnyProvide: Send + Sync {
    /// The provide's name, matched by view patterns.
    fn name(&self) -> &str;

    /// Identity of the value type; typed views only bind on an exact match.
    fn value_type(&self) -> TypeId;

    /// Human-readable type name for diagnostics.
    fn type_label(&self) -> &'static str;

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A named, typed output slot owned by exactly one module.
///
/// The owner updates the value during its execute; consumers resolved to
/// this provide read it through their view. The slot is a `RwLock` so the
/// producer writes and parallel readers read through shared references.
pub struct Provide<T> {
    name: String,
    value: RwLock<T>,
}

impl<T: Send + Sync + 'static> Provide<T> {
    pub fn new(name: impl Into<String>, initial: T) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            value: RwLock::new(initial),
        })
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read().unwrap()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write().unwrap()
    }

    /// Replace the value wholesale.
    pub fn set(&self, value: T) {
        *self.write() = value;
    }
}

impl<T: Send + Sync + 'static> AnyProvide for Provide<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_label(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
