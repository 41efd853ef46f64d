// src/relation/mod.rs

//! Declarative relations: typed provides and the views that consume them.
//!
//! - [`Provide<T>`] exposes a named, typed value slot.
//! - After-views ([`Require`], [`Requires`], [`OrderAfter`]) run their
//!   holder after each matched producer within a round.
//! - Before-views ([`Recycle`], [`Recycles`], [`OrderBefore`]) gate the
//!   producer's next round on the holder's completion.
//!
//! Views match provide names with an anchored regex, compiled once at view
//! construction.

mod provide;
mod view;

pub use provide::{AnyProvide, Provide};
pub use view::{
    OrderAfter, OrderBefore, ProvideView, Recycle, Recycles, Require, Requires, ViewKind,
};

use std::sync::Arc;

/// One element of a module's relation list.
#[derive(Clone)]
pub enum Relation {
    Provide(Arc<dyn AnyProvide>),
    View(Arc<dyn ProvideView>),
}

impl<T: Send + Sync + 'static> From<Arc<Provide<T>>> for Relation {
    fn from(provide: Arc<Provide<T>>) -> Self {
        Relation::Provide(provide)
    }
}

impl<T: Send + Sync + 'static> From<Arc<Require<T>>> for Relation {
    fn from(view: Arc<Require<T>>) -> Self {
        Relation::View(view)
    }
}

impl<T: Send + Sync + 'static> From<Arc<Requires<T>>> for Relation {
    fn from(view: Arc<Requires<T>>) -> Self {
        Relation::View(view)
    }
}

impl<T: Send + Sync + 'static> From<Arc<Recycle<T>>> for Relation {
    fn from(view: Arc<Recycle<T>>) -> Self {
        Relation::View(view)
    }
}

impl<T: Send + Sync + 'static> From<Arc<Recycles<T>>> for Relation {
    fn from(view: Arc<Recycles<T>>) -> Self {
        Relation::View(view)
    }
}

impl From<Arc<OrderAfter>> for Relation {
    fn from(view: Arc<OrderAfter>) -> Self {
        Relation::View(view)
    }
}

impl From<Arc<OrderBefore>> for Relation {
    fn from(view: Arc<OrderBefore>) -> Self {
        Relation::View(view)
    }
}
