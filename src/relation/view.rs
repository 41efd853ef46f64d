// src/relation/view.rs

//! View slots: the consuming side of the relation model.
//!
//! Acceptance semantics:
//! - single-valued views keep the first successful assignment and refuse
//!   everything after it;
//! - multi-valued views record every name-and-type match;
//! - a name match with an incompatible type is refused, and the builder
//!   draws no edge for that pairing.

use std::sync::{Arc, Mutex};

use regex::Regex;

use super::provide::{AnyProvide, Provide};
use crate::errors::Result;

/// Direction a view induces in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// The holder runs after each matched producer within a round.
    After,
    /// The holder runs before each matched producer re-runs.
    Before,
}

/// Type-erased face of a view, used by the graph builder.
pub trait ProvideView: Send + Sync {
    fn kind(&self) -> ViewKind;

    /// The name pattern as written by the user.
    fn pattern(&self) -> &str;

    /// Offer a provide to this view. Returns true iff the view records it;
    /// the builder draws an edge exactly for the pairings that return true.
    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool;

    /// Whether the view ended up bound. Multi-valued views are always
    /// considered resolved; an empty match set is legitimate for them.
    fn resolved(&self) -> bool;
}

fn compile_anchored(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(r"\A(?:{pattern})\z"))?)
}

/// Shared core of the single-valued typed views.
struct SingleSlot<T> {
    pattern: String,
    regex: Regex,
    slot: Mutex<Option<Arc<Provide<T>>>>,
}

impl<T: Send + Sync + 'static> SingleSlot<T> {
    fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: compile_anchored(pattern)?,
            slot: Mutex::new(None),
        })
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            // Only the first successful assignment is kept.
            return false;
        }
        if !self.regex.is_match(provide.name()) {
            return false;
        }
        match Arc::clone(provide).as_any_arc().downcast::<Provide<T>>() {
            Ok(typed) => {
                *slot = Some(typed);
                true
            }
            Err(_) => false,
        }
    }

    fn get(&self) -> Option<Arc<Provide<T>>> {
        self.slot.lock().unwrap().clone()
    }
}

/// Shared core of the multi-valued typed views.
struct MultiSlot<T> {
    pattern: String,
    regex: Regex,
    slots: Mutex<Vec<Arc<Provide<T>>>>,
}

impl<T: Send + Sync + 'static> MultiSlot<T> {
    fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: compile_anchored(pattern)?,
            slots: Mutex::new(Vec::new()),
        })
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        if !self.regex.is_match(provide.name()) {
            return false;
        }
        match Arc::clone(provide).as_any_arc().downcast::<Provide<T>>() {
            Ok(typed) => {
                self.slots.lock().unwrap().push(typed);
                true
            }
            Err(_) => false,
        }
    }

    fn get(&self) -> Vec<Arc<Provide<T>>> {
        self.slots.lock().unwrap().clone()
    }
}

/// Shared core of the untyped, name-only views.
struct AnySlot {
    pattern: String,
    regex: Regex,
    slot: Mutex<Option<Arc<dyn AnyProvide>>>,
}

impl AnySlot {
    fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: compile_anchored(pattern)?,
            slot: Mutex::new(None),
        })
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            return false;
        }
        if !self.regex.is_match(provide.name()) {
            return false;
        }
        *slot = Some(Arc::clone(provide));
        true
    }

    fn get(&self) -> Option<Arc<dyn AnyProvide>> {
        self.slot.lock().unwrap().clone()
    }
}

/// Single-valued after-view: consume one matching provide, running after
/// its producer within each round.
pub struct Require<T> {
    inner: SingleSlot<T>,
}

impl<T: Send + Sync + 'static> Require<T> {
    pub fn new(pattern: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            inner: SingleSlot::new(pattern)?,
        }))
    }

    /// The provide this view bound to, once the graph is built.
    pub fn get(&self) -> Option<Arc<Provide<T>>> {
        self.inner.get()
    }
}

impl<T: Send + Sync + 'static> ProvideView for Require<T> {
    fn kind(&self) -> ViewKind {
        ViewKind::After
    }

    fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        self.inner.accept(provide)
    }

    fn resolved(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Multi-valued after-view: consume every matching provide.
pub struct Requires<T> {
    inner: MultiSlot<T>,
}

impl<T: Send + Sync + 'static> Requires<T> {
    pub fn new(pattern: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            inner: MultiSlot::new(pattern)?,
        }))
    }

    pub fn get(&self) -> Vec<Arc<Provide<T>>> {
        self.inner.get()
    }
}

impl<T: Send + Sync + 'static> ProvideView for Requires<T> {
    fn kind(&self) -> ViewKind {
        ViewKind::After
    }

    fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        self.inner.accept(provide)
    }

    fn resolved(&self) -> bool {
        true
    }
}

/// Single-valued before-view: release one matching provide before its
/// producer runs again.
pub struct Recycle<T> {
    inner: SingleSlot<T>,
}

impl<T: Send + Sync + 'static> Recycle<T> {
    pub fn new(pattern: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            inner: SingleSlot::new(pattern)?,
        }))
    }

    pub fn get(&self) -> Option<Arc<Provide<T>>> {
        self.inner.get()
    }
}

impl<T: Send + Sync + 'static> ProvideView for Recycle<T> {
    fn kind(&self) -> ViewKind {
        ViewKind::Before
    }

    fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        self.inner.accept(provide)
    }

    fn resolved(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Multi-valued before-view.
pub struct Recycles<T> {
    inner: MultiSlot<T>,
}

impl<T: Send + Sync + 'static> Recycles<T> {
    pub fn new(pattern: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            inner: MultiSlot::new(pattern)?,
        }))
    }

    pub fn get(&self) -> Vec<Arc<Provide<T>>> {
        self.inner.get()
    }
}

impl<T: Send + Sync + 'static> ProvideView for Recycles<T> {
    fn kind(&self) -> ViewKind {
        ViewKind::Before
    }

    fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        self.inner.accept(provide)
    }

    fn resolved(&self) -> bool {
        true
    }
}

/// Untyped after-view: a pure ordering dependency on any provide whose
/// name matches, regardless of its value type.
pub struct OrderAfter {
    inner: AnySlot,
}

impl OrderAfter {
    pub fn new(pattern: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            inner: AnySlot::new(pattern)?,
        }))
    }

    pub fn get(&self) -> Option<Arc<dyn AnyProvide>> {
        self.inner.get()
    }
}

impl ProvideView for OrderAfter {
    fn kind(&self) -> ViewKind {
        ViewKind::After
    }

    fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        self.inner.accept(provide)
    }

    fn resolved(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Untyped before-view: gate a matched producer's next round by name only.
pub struct OrderBefore {
    inner: AnySlot,
}

impl OrderBefore {
    pub fn new(pattern: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            inner: AnySlot::new(pattern)?,
        }))
    }

    pub fn get(&self) -> Option<Arc<dyn AnyProvide>> {
        self.inner.get()
    }
}

impl ProvideView for OrderBefore {
    fn kind(&self) -> ViewKind {
        ViewKind::Before
    }

    fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    fn accept(&self, provide: &Arc<dyn AnyProvide>) -> bool {
        self.inner.accept(provide)
    }

    fn resolved(&self) -> bool {
        self.inner.get().is_some()
    }
}
